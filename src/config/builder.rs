//! Fluent builder for `AuthDetectConfig`
//!
//! Every field starts at its default; `build()` rejects values that would
//! make the pipeline misbehave (zero capacities, zero timeouts).

use anyhow::{Result, anyhow};
use std::path::PathBuf;
use std::time::Duration;

use super::types::{ApiKey, AuthDetectConfig};

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Debug, Clone, Default)]
pub struct AuthDetectConfigBuilder {
    config: AuthDetectConfig,
}

impl AuthDetectConfig {
    #[must_use]
    pub fn builder() -> AuthDetectConfigBuilder {
        AuthDetectConfigBuilder::default()
    }
}

impl AuthDetectConfigBuilder {
    #[must_use]
    pub fn gemini_api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.config.gemini_api_key = if key.trim().is_empty() {
            None
        } else {
            Some(ApiKey::new(key))
        };
        self
    }

    #[must_use]
    pub fn gemini_model(mut self, model: impl Into<String>) -> Self {
        self.config.gemini_model = model.into();
        self
    }

    #[must_use]
    pub fn gemini_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.gemini_base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    #[must_use]
    pub fn chrome_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chrome_executable = Some(path.into());
        self
    }

    #[must_use]
    pub fn browser_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.browser_idle_timeout_secs = timeout.as_secs();
        self
    }

    #[must_use]
    pub fn idle_check_interval(mut self, interval: Duration) -> Self {
        self.config.idle_check_interval_secs = interval.as_secs();
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.config.viewport_width = width;
        self.config.viewport_height = height;
        self
    }

    #[must_use]
    pub fn timezone(mut self, timezone: impl Into<String>) -> Self {
        self.config.timezone = timezone.into();
        self
    }

    #[must_use]
    pub fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.config.navigation_timeout_ms = millis(timeout);
        self
    }

    #[must_use]
    pub fn scrape_timeout(mut self, timeout: Duration) -> Self {
        self.config.scrape_timeout_ms = millis(timeout);
        self
    }

    #[must_use]
    pub fn network_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.network_idle_timeout_ms = millis(timeout);
        self
    }

    #[must_use]
    pub fn settle_delays(mut self, after_idle: Duration, after_busy: Duration) -> Self {
        self.config.settle_after_idle_ms = millis(after_idle);
        self.config.settle_after_busy_ms = millis(after_busy);
        self
    }

    #[must_use]
    pub fn capture_screenshots(mut self, enabled: bool) -> Self {
        self.config.capture_screenshots = enabled;
        self
    }

    #[must_use]
    pub fn screenshot_timeout(mut self, timeout: Duration) -> Self {
        self.config.screenshot_timeout_ms = millis(timeout);
        self
    }

    #[must_use]
    pub fn modal_budget(mut self, budget: Duration) -> Self {
        self.config.modal_budget_ms = millis(budget);
        self
    }

    #[must_use]
    pub fn modal_click_timeout(mut self, timeout: Duration) -> Self {
        self.config.modal_click_timeout_ms = millis(timeout);
        self
    }

    #[must_use]
    pub fn modal_settle(mut self, settle: Duration) -> Self {
        self.config.modal_settle_ms = millis(settle);
        self
    }

    #[must_use]
    pub fn ai_timeout(mut self, timeout: Duration) -> Self {
        self.config.ai_timeout_ms = millis(timeout);
        self
    }

    #[must_use]
    pub fn snippet_batch_timeout(mut self, timeout: Duration) -> Self {
        self.config.snippet_batch_timeout_ms = millis(timeout);
        self
    }

    #[must_use]
    pub fn locator_wait(mut self, timeout: Duration) -> Self {
        self.config.locator_wait_ms = millis(timeout);
        self
    }

    #[must_use]
    pub fn oauth_fallback(mut self, per_strategy: Duration, budget: Duration) -> Self {
        self.config.oauth_strategy_timeout_ms = millis(per_strategy);
        self.config.oauth_fallback_budget_ms = millis(budget);
        self
    }

    #[must_use]
    pub fn pattern_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.config.pattern_lookup_timeout_ms = millis(timeout);
        self
    }

    #[must_use]
    pub fn max_snippet_chars(mut self, max: usize) -> Self {
        self.config.max_snippet_chars = max;
        self
    }

    #[must_use]
    pub fn excerpt_bounds(mut self, min_bytes: usize, max_bytes: usize) -> Self {
        self.config.min_excerpt_bytes = min_bytes;
        self.config.max_excerpt_bytes = max_bytes;
        self
    }

    #[must_use]
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl_secs = ttl.as_secs();
        self
    }

    #[must_use]
    pub fn pattern_cache_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.config.pattern_cache_ttl_secs = ttl.map(|t| t.as_secs());
        self
    }

    /// Override the TTL for one host; a leading `www.` is ignored
    #[must_use]
    pub fn domain_ttl(mut self, host: &str, ttl: Duration) -> Self {
        let host = host.trim().to_ascii_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
        self.config.domain_ttl_secs.insert(host, ttl.as_secs());
        self
    }

    #[must_use]
    pub fn cache_not_found(mut self, enabled: bool) -> Self {
        self.config.cache_not_found = enabled;
        self
    }

    #[must_use]
    pub fn cache_pattern_results(mut self, enabled: bool) -> Self {
        self.config.cache_pattern_results = enabled;
        self
    }

    #[must_use]
    pub fn max_cache_entries(mut self, max: usize) -> Self {
        self.config.max_cache_entries = max;
        self
    }

    #[must_use]
    pub fn bind(mut self, host: impl Into<String>, port: u16) -> Self {
        self.config.host = host.into();
        self.config.port = port;
        self
    }

    #[must_use]
    pub fn allowed_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.allowed_origins = origins.into_iter().map(Into::into).collect();
        self
    }

    /// Validate and produce the configuration
    pub fn build(self) -> Result<AuthDetectConfig> {
        let config = self.config;

        if config.max_cache_entries == 0 {
            return Err(anyhow!("max_cache_entries must be greater than zero"));
        }
        if config.max_snippet_chars == 0 {
            return Err(anyhow!("max_snippet_chars must be greater than zero"));
        }
        if config.min_excerpt_bytes > config.max_excerpt_bytes {
            return Err(anyhow!(
                "min_excerpt_bytes ({}) exceeds max_excerpt_bytes ({})",
                config.min_excerpt_bytes,
                config.max_excerpt_bytes
            ));
        }

        let timeouts = [
            ("navigation_timeout", config.navigation_timeout_ms),
            ("scrape_timeout", config.scrape_timeout_ms),
            ("ai_timeout", config.ai_timeout_ms),
            ("snippet_batch_timeout", config.snippet_batch_timeout_ms),
            ("locator_wait", config.locator_wait_ms),
            ("pattern_lookup_timeout", config.pattern_lookup_timeout_ms),
            ("screenshot_timeout", config.screenshot_timeout_ms),
            ("modal_budget", config.modal_budget_ms),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, ms)| *ms == 0) {
            return Err(anyhow!("{name} must be greater than zero"));
        }
        if config.idle_check_interval_secs == 0 {
            return Err(anyhow!("idle_check_interval must be at least one second"));
        }

        Ok(config)
    }
}
