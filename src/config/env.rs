//! Environment loading for `AuthDetectConfig`

use anyhow::{Context, Result};
use std::str::FromStr;
use std::time::Duration;

use super::builder::AuthDetectConfigBuilder;
use super::types::AuthDetectConfig;

impl AuthDetectConfig {
    /// Load configuration from process environment variables
    ///
    /// A missing `GEMINI_API_KEY` is not an error; detection then runs on
    /// the pattern path only.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut builder = AuthDetectConfig::builder();

        if let Some(key) = get("GEMINI_API_KEY") {
            builder = builder.gemini_api_key(key);
        }
        if let Some(model) = get("GEMINI_MODEL") {
            builder = builder.gemini_model(model);
        }
        if let Some(base) = get("GEMINI_BASE_URL") {
            builder = builder.gemini_base_url(base);
        }
        if let Some(path) = get("CHROMIUM_PATH") {
            builder = builder.chrome_executable(path);
        }
        if let Some(headless) = parse::<bool>(&get, "AUTHDETECT_HEADLESS")? {
            builder = builder.headless(headless);
        }
        if let Some(secs) = parse::<u64>(&get, "AUTHDETECT_BROWSER_IDLE_SECS")? {
            builder = builder.browser_idle_timeout(Duration::from_secs(secs));
        }
        if let Some(ms) = parse::<u64>(&get, "AUTHDETECT_NAVIGATION_TIMEOUT_MS")? {
            builder = builder.navigation_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = parse::<u64>(&get, "AUTHDETECT_SCRAPE_TIMEOUT_MS")? {
            builder = builder.scrape_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = parse::<u64>(&get, "AUTHDETECT_AI_TIMEOUT_MS")? {
            builder = builder.ai_timeout(Duration::from_millis(ms));
        }
        if let Some(enabled) = parse::<bool>(&get, "AUTHDETECT_SCREENSHOTS")? {
            builder = builder.capture_screenshots(enabled);
        }
        if let Some(secs) = parse::<u64>(&get, "AUTHDETECT_CACHE_TTL_SECS")? {
            builder = builder.cache_ttl(Duration::from_secs(secs));
        }
        if let Some(secs) = parse::<u64>(&get, "AUTHDETECT_PATTERN_CACHE_TTL_SECS")? {
            let ttl = (secs > 0).then(|| Duration::from_secs(secs));
            builder = builder.pattern_cache_ttl(ttl);
        }
        if let Some(enabled) = parse::<bool>(&get, "AUTHDETECT_CACHE_NOT_FOUND")? {
            builder = builder.cache_not_found(enabled);
        }
        if let Some(enabled) = parse::<bool>(&get, "AUTHDETECT_CACHE_PATTERN")? {
            builder = builder.cache_pattern_results(enabled);
        }
        if let Some(max) = parse::<usize>(&get, "AUTHDETECT_CACHE_MAX_ENTRIES")? {
            builder = builder.max_cache_entries(max);
        }
        builder = apply_bind(builder, &get)?;
        if let Some(origins) = get("ALLOWED_ORIGINS") {
            builder = builder.allowed_origins(
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(String::from),
            );
        }

        builder.build()
    }
}

fn apply_bind<G>(builder: AuthDetectConfigBuilder, get: &G) -> Result<AuthDetectConfigBuilder>
where
    G: Fn(&str) -> Option<String>,
{
    let host = get("HOST");
    let port = parse::<u16>(get, "PORT")?;
    if host.is_none() && port.is_none() {
        return Ok(builder);
    }
    let defaults = AuthDetectConfig::default();
    Ok(builder.bind(
        host.unwrap_or(defaults.host),
        port.unwrap_or(defaults.port),
    ))
}

fn parse<T>(get: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    get(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{name} has an invalid value: {raw}"))
        })
        .transpose()
}
