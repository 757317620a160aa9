//! Page acquisition ownership: every page and context is closed exactly once

use kodegen_tools_authdetect::acquisition::PageAcquirer;
use kodegen_tools_authdetect::browser_pool::BrowserPool;
use kodegen_tools_authdetect::config::AuthDetectConfig;
use kodegen_tools_authdetect::dom::{DomProbe, Locator};
use kodegen_tools_authdetect::error::AuthDetectError;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

mod common;
use common::{FakeLauncher, Navigation, fake_pool, init_tracing};

fn acquirer(launcher: FakeLauncher) -> (Arc<BrowserPool<FakeLauncher>>, PageAcquirer<FakeLauncher>) {
    let config = AuthDetectConfig::builder()
        .scrape_timeout(Duration::from_millis(300))
        .modal_settle(Duration::from_millis(1))
        .build()
        .unwrap();
    let pool = fake_pool(launcher, Duration::from_secs(300));
    let acquirer = PageAcquirer::new(Arc::clone(&pool), Arc::new(config));
    (pool, acquirer)
}

fn assert_fully_released(launcher: &FakeLauncher, pool: &BrowserPool<FakeLauncher>) {
    let browser = launcher.browser(0);
    assert_eq!(browser.pages_opened.load(Ordering::SeqCst), 1);
    assert_eq!(browser.pages_closed.load(Ordering::SeqCst), 1);
    assert_eq!(
        browser.contexts_disposed.load(Ordering::SeqCst),
        browser.contexts_created.load(Ordering::SeqCst)
    );
    assert_eq!(pool.active_contexts(), 0);
}

#[tokio::test]
async fn test_successful_acquisition_hands_over_live_session() {
    init_tracing();
    let launcher = FakeLauncher::default();
    let (pool, acquirer) = acquirer(launcher.clone());

    let page = acquirer.acquire("https://example.com/login", "req_ok").await.unwrap();

    assert!(page.html.contains(r#"id="login""#));
    assert_eq!(page.title.as_deref(), Some("Sign in - Example"));
    assert!(page.screenshot.is_some());
    assert!(page.metadata.network_idle);
    assert!(page.metadata.has_auth_accessibility_signals);
    assert!(!page.metadata.modal_triggered);

    // Page and context stay open while the caller holds the session
    let browser = launcher.browser(0);
    assert_eq!(pool.active_contexts(), 1);
    assert_eq!(browser.pages_closed.load(Ordering::SeqCst), 0);
    let form = page
        .session
        .dom()
        .outer_html(&Locator::css("form#login"))
        .await
        .unwrap();
    assert!(form.is_some());

    page.session.release().await;
    assert_fully_released(&launcher, &pool);
}

#[tokio::test]
async fn test_navigation_failure_closes_page_and_context() {
    let launcher = FakeLauncher::with_navigation(Navigation::Fail);
    let (pool, acquirer) = acquirer(launcher.clone());

    let error = acquirer
        .acquire("https://nope.invalid/", "req_nav")
        .await
        .err()
        .unwrap();

    assert!(matches!(error, AuthDetectError::Navigation { .. }));
    assert!(error.to_string().contains("ERR_NAME_NOT_RESOLVED"));
    assert_fully_released(&launcher, &pool);
}

#[tokio::test]
async fn test_overall_timeout_closes_page_and_context() {
    let launcher = FakeLauncher::with_navigation(Navigation::Hang);
    let (pool, acquirer) = acquirer(launcher.clone());

    let started = Instant::now();
    let error = acquirer
        .acquire("https://slow.example.com/", "req_slow")
        .await
        .err()
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(matches!(
        error,
        AuthDetectError::Timeout {
            operation: "Page acquisition",
            ..
        }
    ));
    assert_fully_released(&launcher, &pool);
}

#[tokio::test]
async fn test_dropped_session_is_released_in_background() {
    let launcher = FakeLauncher::default();
    let (pool, acquirer) = acquirer(launcher.clone());

    let page = acquirer.acquire("https://example.com/login", "req_drop").await.unwrap();
    assert_eq!(pool.active_contexts(), 1);
    drop(page);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_fully_released(&launcher, &pool);
}

#[tokio::test]
async fn test_launch_failure_leaves_nothing_open() {
    let launcher = FakeLauncher::default();
    launcher.fail_next.store(true, Ordering::SeqCst);
    let (pool, acquirer) = acquirer(launcher.clone());

    let error = acquirer
        .acquire("https://example.com/", "req_launch")
        .await
        .err()
        .unwrap();

    assert!(matches!(error, AuthDetectError::BrowserLaunch(_)));
    assert!(launcher.browsers.lock().is_empty());
    assert_eq!(pool.active_contexts(), 0);
}
