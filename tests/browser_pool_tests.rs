//! Browser pool behavior against a fake launcher

use std::sync::atomic::Ordering;
use std::time::Duration;

mod common;
use common::{FakeLauncher, fake_pool, init_tracing};

#[tokio::test]
async fn test_pool_launches_lazily() {
    init_tracing();
    let launcher = FakeLauncher::default();
    let pool = fake_pool(launcher.clone(), Duration::from_secs(300));

    assert_eq!(launcher.launched(), 0);
    let health = pool.health_check();
    assert!(!health.healthy);
    assert!(health.idle_time_ms.is_none());

    let ctx = pool.acquire_context("req_a").await.unwrap();
    assert_eq!(launcher.launched(), 1);
    assert_eq!(pool.active_contexts(), 1);
    assert!(pool.health_check().healthy);

    pool.release_context(ctx).await;
    assert_eq!(pool.active_contexts(), 0);
    assert_eq!(launcher.browser(0).contexts_disposed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_concurrent_acquirers_share_one_launch() {
    let launcher = FakeLauncher::with_delay(Duration::from_millis(100));
    let pool = fake_pool(launcher.clone(), Duration::from_secs(300));

    let acquisitions = (0..8).map(|i| {
        let pool = pool.clone();
        tokio::spawn(async move { pool.acquire_context(&format!("req_{i}")).await })
    });
    let contexts: Vec<_> = futures::future::join_all(acquisitions)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    assert_eq!(launcher.launched(), 1);
    assert_eq!(pool.launch_count(), 1);
    assert_eq!(launcher.browser(0).contexts_created.load(Ordering::SeqCst), 8);
    assert_eq!(pool.active_contexts(), 8);

    for ctx in contexts {
        pool.release_context(ctx).await;
    }
    assert_eq!(pool.active_contexts(), 0);
}

#[tokio::test]
async fn test_cancelled_acquirer_does_not_abort_shared_launch() {
    let launcher = FakeLauncher::with_delay(Duration::from_millis(150));
    let pool = fake_pool(launcher.clone(), Duration::from_secs(300));

    let impatient = tokio::time::timeout(Duration::from_millis(20), pool.acquire_context("req_a")).await;
    assert!(impatient.is_err());

    let ctx = pool.acquire_context("req_b").await.unwrap();
    assert_eq!(launcher.launched(), 1);
    pool.release_context(ctx).await;
}

#[tokio::test]
async fn test_launch_failure_resets_state() {
    let launcher = FakeLauncher::default();
    launcher.fail_next.store(true, Ordering::SeqCst);
    let pool = fake_pool(launcher.clone(), Duration::from_secs(300));

    let err = pool.acquire_context("req_a").await.err().unwrap();
    assert!(err.to_string().contains("chrome exited during startup"));
    assert!(!pool.health_check().initializing);

    let ctx = pool.acquire_context("req_b").await.unwrap();
    assert_eq!(launcher.launched(), 2);
    pool.release_context(ctx).await;
}

#[tokio::test]
async fn test_disconnected_browser_is_relaunched() {
    let launcher = FakeLauncher::default();
    let pool = fake_pool(launcher.clone(), Duration::from_secs(300));

    let ctx = pool.acquire_context("req_a").await.unwrap();
    pool.release_context(ctx).await;

    let first = launcher.browser(0);
    first.connected.store(false, Ordering::SeqCst);
    assert!(!pool.health_check().healthy);

    let ctx = pool.acquire_context("req_b").await.unwrap();
    assert_eq!(launcher.launched(), 2);
    pool.release_context(ctx).await;

    // Stale handle is closed in the background
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(first.closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_context_dispose_failure_is_swallowed() {
    let launcher = FakeLauncher::default();
    let pool = fake_pool(launcher.clone(), Duration::from_secs(300));

    let ctx = pool.acquire_context("req_a").await.unwrap();
    launcher.browser(0).fail_dispose.store(true, Ordering::SeqCst);
    pool.release_context(ctx).await;

    assert_eq!(pool.active_contexts(), 0);
    assert!(pool.health_check().healthy);
}

#[tokio::test]
async fn test_idle_browser_is_retired_and_relaunched() {
    let launcher = FakeLauncher::default();
    let pool = fake_pool(launcher.clone(), Duration::from_millis(30));

    let ctx = pool.acquire_context("req_a").await.unwrap();
    pool.release_context(ctx).await;

    assert!(!pool.retire_if_idle().await);
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(pool.retire_if_idle().await);
    assert!(launcher.browser(0).closed.load(Ordering::SeqCst));
    assert!(!pool.health_check().healthy);

    let ctx = pool.acquire_context("req_b").await.unwrap();
    assert_eq!(launcher.launched(), 2);
    pool.release_context(ctx).await;
}

#[tokio::test]
async fn test_outstanding_context_blocks_retirement() {
    let launcher = FakeLauncher::default();
    let pool = fake_pool(launcher.clone(), Duration::from_millis(10));

    let ctx = pool.acquire_context("req_a").await.unwrap();
    tokio::time::sleep(Duration::from_millis(40)).await;
    assert!(!pool.retire_if_idle().await);

    pool.release_context(ctx).await;
    tokio::time::sleep(Duration::from_millis(40)).await;
    assert!(pool.retire_if_idle().await);
}

#[tokio::test]
async fn test_reaper_runs_until_shutdown() {
    let launcher = FakeLauncher::default();
    let pool = fake_pool(launcher.clone(), Duration::from_millis(30));

    let reaper = pool.start_idle_reaper();
    let ctx = pool.acquire_context("req_a").await.unwrap();
    pool.release_context(ctx).await;

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(launcher.browser(0).closed.load(Ordering::SeqCst));

    pool.shutdown().await;
    tokio::time::timeout(Duration::from_secs(1), reaper)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_shutdown_closes_browser_and_rejects_new_work() {
    let launcher = FakeLauncher::default();
    let pool = fake_pool(launcher.clone(), Duration::from_secs(300));

    let ctx = pool.acquire_context("req_a").await.unwrap();
    pool.release_context(ctx).await;
    pool.shutdown().await;

    assert!(launcher.browser(0).closed.load(Ordering::SeqCst));
    assert!(pool.acquire_context("req_b").await.is_err());
    assert_eq!(launcher.launched(), 1);
}
