//! Configuration flowing from the environment into service components

use kodegen_tools_authdetect::browser_pool::BrowserPoolConfig;
use kodegen_tools_authdetect::config::AuthDetectConfig;
use kodegen_tools_authdetect::detector::{Detector, SnippetSettings};
use kodegen_tools_authdetect::AuthDetectService;
use std::collections::HashMap;
use std::time::Duration;

fn from_vars(vars: &[(&str, &str)]) -> anyhow::Result<AuthDetectConfig> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    AuthDetectConfig::from_lookup(move |name| map.get(name).cloned())
}

#[test]
fn test_without_api_key_detector_is_pattern_only() {
    let config = from_vars(&[("GEMINI_API_KEY", "   ")]).unwrap();
    let detector = Detector::from_config(&config).unwrap();
    assert!(!detector.has_model());
}

#[test]
fn test_api_key_enables_model() {
    let config = from_vars(&[("GEMINI_API_KEY", "secret"), ("GEMINI_MODEL", "gemini-test")]).unwrap();
    assert_eq!(config.gemini_model(), "gemini-test");
    assert!(!format!("{config:?}").contains("secret"));

    let service = AuthDetectService::new(config).unwrap();
    assert!(service.detector().has_model());
    assert_eq!(service.pool().launch_count(), 0);
}

#[test]
fn test_timeouts_reach_components() {
    let config = from_vars(&[("AUTHDETECT_BROWSER_IDLE_SECS", "30")]).unwrap();
    let pool = BrowserPoolConfig::from(&config);
    assert_eq!(pool.idle_timeout, Duration::from_secs(30));

    let config = AuthDetectConfig::builder()
        .locator_wait(Duration::from_millis(250))
        .oauth_fallback(Duration::from_millis(100), Duration::from_secs(2))
        .max_snippet_chars(900)
        .build()
        .unwrap();
    let snippets = SnippetSettings::from(&config);
    assert_eq!(snippets.locator_wait, Duration::from_millis(250));
    assert_eq!(snippets.strategy_timeout, Duration::from_millis(100));
    assert_eq!(snippets.oauth_budget, Duration::from_secs(2));
    assert_eq!(snippets.max_chars, 900);
}

#[test]
fn test_bind_and_origins() {
    let config = from_vars(&[
        ("HOST", "127.0.0.1"),
        ("ALLOWED_ORIGINS", "https://app.example,, "),
    ])
    .unwrap();
    assert_eq!(config.bind_address(), "127.0.0.1:3000");
    assert_eq!(config.allowed_origins(), ["https://app.example".to_string()]);
}

#[test]
fn test_invalid_values_are_reported() {
    assert!(from_vars(&[("AUTHDETECT_HEADLESS", "sometimes")]).is_err());
    assert!(from_vars(&[("AUTHDETECT_CACHE_MAX_ENTRIES", "0")]).is_err());
}
