//! Core configuration types for auth detection
//!
//! `AuthDetectConfig` carries every timeout, TTL and limit the pipeline
//! uses. Durations are stored as integer milliseconds or seconds and exposed
//! as `Duration` through the getters.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use crate::utils::constants::*;

/// Model credential, redacted from debug output
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Main configuration struct for the detection service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthDetectConfig {
    // Browser pool
    pub(crate) headless: bool,
    pub(crate) chrome_executable: Option<PathBuf>,
    pub(crate) browser_idle_timeout_secs: u64,
    pub(crate) idle_check_interval_secs: u64,
    pub(crate) user_agent: String,
    pub(crate) viewport_width: u32,
    pub(crate) viewport_height: u32,
    pub(crate) timezone: String,

    // Page acquisition
    pub(crate) navigation_timeout_ms: u64,
    pub(crate) scrape_timeout_ms: u64,
    pub(crate) network_idle_timeout_ms: u64,
    pub(crate) network_quiet_window_ms: u64,
    pub(crate) settle_after_idle_ms: u64,
    pub(crate) settle_after_busy_ms: u64,
    pub(crate) capture_screenshots: bool,
    pub(crate) screenshot_timeout_ms: u64,
    pub(crate) screenshot_quality: u8,

    // Modal reveal
    pub(crate) modal_budget_ms: u64,
    pub(crate) modal_click_timeout_ms: u64,
    pub(crate) modal_settle_ms: u64,

    // Detector
    #[serde(skip_serializing)]
    pub(crate) gemini_api_key: Option<ApiKey>,
    pub(crate) gemini_model: String,
    pub(crate) gemini_base_url: String,
    pub(crate) ai_timeout_ms: u64,
    pub(crate) snippet_batch_timeout_ms: u64,
    pub(crate) locator_wait_ms: u64,
    pub(crate) oauth_strategy_timeout_ms: u64,
    pub(crate) oauth_fallback_budget_ms: u64,
    pub(crate) pattern_lookup_timeout_ms: u64,
    pub(crate) max_snippet_chars: usize,
    pub(crate) max_excerpt_bytes: usize,
    pub(crate) min_excerpt_bytes: usize,

    // Result cache
    pub(crate) cache_ttl_secs: u64,
    /// `None` gives pattern results the default TTL
    pub(crate) pattern_cache_ttl_secs: Option<u64>,
    /// Exact-host overrides, keyed without `www.`
    pub(crate) domain_ttl_secs: HashMap<String, u64>,
    pub(crate) cache_not_found: bool,
    pub(crate) cache_pattern_results: bool,
    pub(crate) max_cache_entries: usize,
    pub(crate) cache_purge_interval_secs: u64,

    // HTTP surface
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) allowed_origins: Vec<String>,
}

impl Default for AuthDetectConfig {
    fn default() -> Self {
        let domain_ttl_secs = [
            ("localhost".to_string(), LOCAL_HOST_CACHE_TTL_SECS),
            ("127.0.0.1".to_string(), LOCAL_HOST_CACHE_TTL_SECS),
        ]
        .into_iter()
        .collect();

        Self {
            headless: true,
            chrome_executable: None,
            browser_idle_timeout_secs: DEFAULT_BROWSER_IDLE_TIMEOUT_SECS,
            idle_check_interval_secs: DEFAULT_IDLE_CHECK_INTERVAL_SECS,
            user_agent: CHROME_USER_AGENT.to_string(),
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            timezone: DEFAULT_TIMEZONE.to_string(),

            navigation_timeout_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
            scrape_timeout_ms: DEFAULT_SCRAPE_TIMEOUT_MS,
            network_idle_timeout_ms: DEFAULT_NETWORK_IDLE_TIMEOUT_MS,
            network_quiet_window_ms: DEFAULT_NETWORK_QUIET_WINDOW_MS,
            settle_after_idle_ms: DEFAULT_SETTLE_AFTER_IDLE_MS,
            settle_after_busy_ms: DEFAULT_SETTLE_AFTER_BUSY_MS,
            capture_screenshots: true,
            screenshot_timeout_ms: DEFAULT_SCREENSHOT_TIMEOUT_MS,
            screenshot_quality: SCREENSHOT_QUALITY,

            modal_budget_ms: DEFAULT_MODAL_BUDGET_MS,
            modal_click_timeout_ms: DEFAULT_MODAL_CLICK_TIMEOUT_MS,
            modal_settle_ms: DEFAULT_MODAL_SETTLE_MS,

            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            ai_timeout_ms: DEFAULT_AI_TIMEOUT_MS,
            snippet_batch_timeout_ms: DEFAULT_SNIPPET_BATCH_TIMEOUT_MS,
            locator_wait_ms: DEFAULT_LOCATOR_WAIT_MS,
            oauth_strategy_timeout_ms: DEFAULT_OAUTH_STRATEGY_TIMEOUT_MS,
            oauth_fallback_budget_ms: DEFAULT_OAUTH_FALLBACK_BUDGET_MS,
            pattern_lookup_timeout_ms: DEFAULT_PATTERN_LOOKUP_TIMEOUT_MS,
            max_snippet_chars: DEFAULT_MAX_SNIPPET_CHARS,
            max_excerpt_bytes: DEFAULT_MAX_EXCERPT_BYTES,
            min_excerpt_bytes: DEFAULT_MIN_EXCERPT_BYTES,

            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            pattern_cache_ttl_secs: Some(DEFAULT_PATTERN_CACHE_TTL_SECS),
            domain_ttl_secs,
            cache_not_found: true,
            cache_pattern_results: true,
            max_cache_entries: DEFAULT_MAX_CACHE_ENTRIES,
            cache_purge_interval_secs: DEFAULT_CACHE_PURGE_INTERVAL_SECS,

            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}
