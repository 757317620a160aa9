//! Result cache: key normalization, TTL policy, eligibility and stats

use kodegen_tools_authdetect::cache::{CachePolicy, ResultCache};
use kodegen_tools_authdetect::config::AuthDetectConfig;
use kodegen_tools_authdetect::detector::{
    AuthComponent, ComponentDetails, ComponentType, DetectionMethod, DetectionResult,
};
use kodegen_tools_authdetect::utils::normalize_cache_key;
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn found(url: &str, method: DetectionMethod) -> DetectionResult {
    DetectionResult::detected(
        url,
        vec![AuthComponent::new(ComponentType::Traditional, ComponentDetails::default())],
        method,
    )
}

fn cache_with(config: AuthDetectConfig) -> ResultCache {
    ResultCache::new(CachePolicy::from_config(&config))
}

#[test]
fn test_tracking_params_and_trailing_slash_share_an_entry() {
    let cache = ResultCache::default();
    assert!(cache.set("https://www.example.com/login/?utm_source=x#top", &found("https://example.com/login", DetectionMethod::Ai)));

    assert!(cache.has("https://example.com/login"));
    assert!(cache.get("http://example.com/login").is_none());
    let hit = cache.get("https://example.com/login?ref=nav").unwrap();
    assert!(hit.found);
}

#[test]
fn test_failures_are_never_cached() {
    let cache = ResultCache::default();
    let failed = DetectionResult::failure("https://example.com/", "net::ERR_NAME_NOT_RESOLVED");
    assert!(!cache.set("https://example.com/", &failed));
    assert!(cache.is_empty());
}

#[test]
fn test_not_found_caching_is_switchable() {
    let negative = DetectionResult::detected("https://example.com/", vec![], DetectionMethod::Ai);

    let default = ResultCache::default();
    assert!(default.set("https://example.com/", &negative));

    let strict = cache_with(AuthDetectConfig::builder().cache_not_found(false).build().unwrap());
    assert!(!strict.set("https://example.com/", &negative));
}

#[test]
fn test_ttl_precedence() {
    let policy = CachePolicy::from_config(
        &AuthDetectConfig::builder()
            .cache_ttl(Duration::from_secs(100))
            .pattern_cache_ttl(Some(Duration::from_secs(10)))
            .domain_ttl("www.staging.test", Duration::from_secs(1))
            .build()
            .unwrap(),
    );

    assert_eq!(policy.ttl_for("https://a.test/", DetectionMethod::Ai), Duration::from_secs(100));
    assert_eq!(policy.ttl_for("https://a.test/", DetectionMethod::Pattern), Duration::from_secs(10));
    assert_eq!(
        policy.ttl_for("https://staging.test/x", DetectionMethod::Pattern),
        Duration::from_secs(1)
    );
    assert_eq!(
        policy.ttl_for("http://localhost:8080/", DetectionMethod::Ai),
        Duration::from_secs(300)
    );
}

#[test]
fn test_hybrid_results_follow_pattern_policy() {
    let policy = CachePolicy::from_config(
        &AuthDetectConfig::builder()
            .cache_ttl(Duration::from_secs(100))
            .pattern_cache_ttl(Some(Duration::from_secs(10)))
            .build()
            .unwrap(),
    );
    assert_eq!(policy.ttl_for("https://a.test/", DetectionMethod::Hybrid), Duration::from_secs(10));

    let hybrid = found("https://a.test/", DetectionMethod::Hybrid);
    let no_patterns = cache_with(AuthDetectConfig::builder().cache_pattern_results(false).build().unwrap());
    assert!(!no_patterns.set("https://a.test/", &hybrid));
    assert!(!no_patterns.set("https://a.test/", &found("https://a.test/", DetectionMethod::Pattern)));
    assert!(no_patterns.set("https://a.test/", &found("https://a.test/", DetectionMethod::Ai)));
    assert_eq!(no_patterns.len(), 1);
}

#[tokio::test]
async fn test_expired_entries_miss_and_are_removed() {
    let cache = cache_with(
        AuthDetectConfig::builder()
            .domain_ttl("short.test", Duration::ZERO)
            .build()
            .unwrap(),
    );
    cache.set("https://short.test/", &found("https://short.test/", DetectionMethod::Ai));
    cache.set("https://long.test/", &found("https://long.test/", DetectionMethod::Ai));

    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(!cache.has("https://short.test/"));
    assert_eq!(cache.purge_expired(), 1);
    assert_eq!(cache.len(), 1);
    assert!(cache.get("https://short.test/").is_none());
}

#[test]
fn test_stats_track_hits_and_misses() {
    let cache = ResultCache::default();
    cache.set("https://a.test/", &found("https://a.test/", DetectionMethod::Ai));

    cache.get("https://a.test/");
    cache.get("https://a.test/");
    cache.get("https://b.test/");

    let stats = cache.stats();
    assert_eq!(stats.size, 1);
    assert_eq!(stats.max_entries, 1000);
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
    assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-9);
    assert!(stats.oldest_entry.is_some());
    assert_eq!(stats.oldest_entry, stats.newest_entry);
}

#[test]
fn test_invalidate_and_clear() {
    let cache = ResultCache::default();
    cache.set("https://a.test/x", &found("https://a.test/x", DetectionMethod::Ai));
    cache.set("https://b.test/", &found("https://b.test/", DetectionMethod::Ai));

    assert!(cache.invalidate("https://www.a.test/x/"));
    assert!(!cache.invalidate("https://a.test/x"));
    cache.clear();
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_cleanup_task_purges_and_stops() {
    let cache = Arc::new(cache_with(
        AuthDetectConfig::builder()
            .domain_ttl("short.test", Duration::ZERO)
            .build()
            .unwrap(),
    ));
    cache.set("https://short.test/", &found("https://short.test/", DetectionMethod::Ai));

    let shutdown = CancellationToken::new();
    let task = Arc::clone(&cache).start_cleanup_task(Duration::from_millis(20), shutdown.clone());

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(cache.is_empty());

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
}

proptest! {
    #[test]
    fn prop_normalization_is_idempotent(
        www in any::<bool>(),
        host in "[a-z]{1,10}",
        segments in prop::collection::vec("[a-z0-9]{1,5}", 0..4),
        trailing in any::<bool>(),
        query in prop::option::of("[a-z]{1,3}=[0-9]{1,3}"),
    ) {
        prop_assume!(host != "www");
        let mut url = format!("https://{}{}.test/{}", if www { "www." } else { "" }, host, segments.join("/"));
        if trailing && !segments.is_empty() {
            url.push('/');
        }
        if let Some(query) = query {
            url.push('?');
            url.push_str(&query);
        }

        let key = normalize_cache_key(&url);
        prop_assert_eq!(normalize_cache_key(&key), key.clone());
        prop_assert!(!key.contains('?'));
        prop_assert!(!key.starts_with("https://www."));
        let root = format!("https://{}.test/", host);
        prop_assert!(key == root || !key.ends_with('/'));
    }
}
