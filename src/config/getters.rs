//! Getter methods for `AuthDetectConfig`

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use super::types::{ApiKey, AuthDetectConfig};

impl AuthDetectConfig {
    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn chrome_executable(&self) -> Option<&Path> {
        self.chrome_executable.as_deref()
    }

    #[must_use]
    pub fn browser_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.browser_idle_timeout_secs)
    }

    #[must_use]
    pub fn idle_check_interval(&self) -> Duration {
        Duration::from_secs(self.idle_check_interval_secs)
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    #[must_use]
    pub fn viewport(&self) -> (u32, u32) {
        (self.viewport_width, self.viewport_height)
    }

    #[must_use]
    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    /// Overall bound on one page acquisition, navigation included
    #[must_use]
    pub fn scrape_timeout(&self) -> Duration {
        Duration::from_millis(self.scrape_timeout_ms)
    }

    #[must_use]
    pub fn network_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.network_idle_timeout_ms)
    }

    #[must_use]
    pub fn network_quiet_window(&self) -> Duration {
        Duration::from_millis(self.network_quiet_window_ms)
    }

    #[must_use]
    pub fn settle_after_idle(&self) -> Duration {
        Duration::from_millis(self.settle_after_idle_ms)
    }

    #[must_use]
    pub fn settle_after_busy(&self) -> Duration {
        Duration::from_millis(self.settle_after_busy_ms)
    }

    #[must_use]
    pub fn capture_screenshots(&self) -> bool {
        self.capture_screenshots
    }

    #[must_use]
    pub fn screenshot_timeout(&self) -> Duration {
        Duration::from_millis(self.screenshot_timeout_ms)
    }

    #[must_use]
    pub fn screenshot_quality(&self) -> u8 {
        self.screenshot_quality
    }

    #[must_use]
    pub fn modal_budget(&self) -> Duration {
        Duration::from_millis(self.modal_budget_ms)
    }

    #[must_use]
    pub fn modal_click_timeout(&self) -> Duration {
        Duration::from_millis(self.modal_click_timeout_ms)
    }

    #[must_use]
    pub fn modal_settle(&self) -> Duration {
        Duration::from_millis(self.modal_settle_ms)
    }

    #[must_use]
    pub fn gemini_api_key(&self) -> Option<&ApiKey> {
        self.gemini_api_key.as_ref()
    }

    #[must_use]
    pub fn gemini_model(&self) -> &str {
        &self.gemini_model
    }

    #[must_use]
    pub fn gemini_base_url(&self) -> &str {
        &self.gemini_base_url
    }

    #[must_use]
    pub fn ai_timeout(&self) -> Duration {
        Duration::from_millis(self.ai_timeout_ms)
    }

    #[must_use]
    pub fn snippet_batch_timeout(&self) -> Duration {
        Duration::from_millis(self.snippet_batch_timeout_ms)
    }

    #[must_use]
    pub fn locator_wait(&self) -> Duration {
        Duration::from_millis(self.locator_wait_ms)
    }

    #[must_use]
    pub fn oauth_strategy_timeout(&self) -> Duration {
        Duration::from_millis(self.oauth_strategy_timeout_ms)
    }

    #[must_use]
    pub fn oauth_fallback_budget(&self) -> Duration {
        Duration::from_millis(self.oauth_fallback_budget_ms)
    }

    #[must_use]
    pub fn pattern_lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.pattern_lookup_timeout_ms)
    }

    #[must_use]
    pub fn max_snippet_chars(&self) -> usize {
        self.max_snippet_chars
    }

    #[must_use]
    pub fn max_excerpt_bytes(&self) -> usize {
        self.max_excerpt_bytes
    }

    #[must_use]
    pub fn min_excerpt_bytes(&self) -> usize {
        self.min_excerpt_bytes
    }

    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    #[must_use]
    pub fn pattern_cache_ttl(&self) -> Option<Duration> {
        self.pattern_cache_ttl_secs.map(Duration::from_secs)
    }

    #[must_use]
    pub fn domain_ttls(&self) -> HashMap<String, Duration> {
        self.domain_ttl_secs
            .iter()
            .map(|(host, secs)| (host.clone(), Duration::from_secs(*secs)))
            .collect()
    }

    #[must_use]
    pub fn cache_not_found(&self) -> bool {
        self.cache_not_found
    }

    #[must_use]
    pub fn cache_pattern_results(&self) -> bool {
        self.cache_pattern_results
    }

    #[must_use]
    pub fn max_cache_entries(&self) -> usize {
        self.max_cache_entries
    }

    #[must_use]
    pub fn cache_purge_interval(&self) -> Duration {
        Duration::from_secs(self.cache_purge_interval_secs)
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[must_use]
    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }
}
