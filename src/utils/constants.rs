//! Shared configuration constants for authdetect
//!
//! Default values used by the configuration builder and throughout the
//! pipeline, kept in one place to avoid magic numbers.

/// Chrome user agent string presented by every browsing context
///
/// Updated: 2025-01-29 to Chrome 132 (current stable)
/// Next update: 2025-04-29 (quarterly schedule)
///
/// Reference: https://chromiumdash.appspot.com/schedule
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Desktop viewport applied to every page
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1920;
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 1080;

/// Timezone override applied to every page
pub const DEFAULT_TIMEZONE: &str = "America/New_York";

/// Screenshot quality: 80% JPEG compression
///
/// Keeps the inline image sent to the model around 50-100KB.
pub const SCREENSHOT_QUALITY: u8 = 80;

/// Browser is retired after 5 minutes without an acquisition
pub const DEFAULT_BROWSER_IDLE_TIMEOUT_SECS: u64 = 300;

/// Idle reaper tick
pub const DEFAULT_IDLE_CHECK_INTERVAL_SECS: u64 = 60;

pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_SCRAPE_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_NETWORK_IDLE_TIMEOUT_MS: u64 = 10_000;

/// Resource-timing count must hold still this long to count as network idle
pub const DEFAULT_NETWORK_QUIET_WINDOW_MS: u64 = 500;

pub const DEFAULT_SETTLE_AFTER_IDLE_MS: u64 = 500;
pub const DEFAULT_SETTLE_AFTER_BUSY_MS: u64 = 1_500;
pub const DEFAULT_SCREENSHOT_TIMEOUT_MS: u64 = 10_000;

pub const DEFAULT_MODAL_BUDGET_MS: u64 = 5_000;
pub const DEFAULT_MODAL_CLICK_TIMEOUT_MS: u64 = 1_000;
pub const DEFAULT_MODAL_SETTLE_MS: u64 = 300;

pub const DEFAULT_AI_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_SNIPPET_BATCH_TIMEOUT_MS: u64 = 20_000;
pub const DEFAULT_LOCATOR_WAIT_MS: u64 = 5_000;
pub const DEFAULT_OAUTH_STRATEGY_TIMEOUT_MS: u64 = 1_500;
pub const DEFAULT_OAUTH_FALLBACK_BUDGET_MS: u64 = 8_000;

/// Limit on each heuristic lookup against the live page
pub const DEFAULT_PATTERN_LOOKUP_TIMEOUT_MS: u64 = 3_000;

/// Snippets longer than this are cut and re-balanced
pub const DEFAULT_MAX_SNIPPET_CHARS: usize = 1_500;

/// Upper bound on the HTML excerpt sent to the model
pub const DEFAULT_MAX_EXCERPT_BYTES: usize = 15_000;

/// Excerpts shorter than this are replaced with the head of the body
pub const DEFAULT_MIN_EXCERPT_BYTES: usize = 500;

/// 24 hours
pub const DEFAULT_CACHE_TTL_SECS: u64 = 86_400;

/// 6 hours for pattern-derived results
pub const DEFAULT_PATTERN_CACHE_TTL_SECS: u64 = 21_600;

/// Loopback hosts change constantly during development
pub const LOCAL_HOST_CACHE_TTL_SECS: u64 = 300;

pub const DEFAULT_MAX_CACHE_ENTRIES: usize = 1_000;
pub const DEFAULT_CACHE_PURGE_INTERVAL_SECS: u64 = 60;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;

/// Marker placed between the light DOM and serialized shadow roots
pub const SHADOW_DOM_MARKER: &str = "<!-- SHADOW DOM CONTENT -->";

/// Provider names scanned by the pattern detector
pub const OAUTH_PROVIDERS: [&str; 6] = [
    "google",
    "facebook",
    "github",
    "twitter",
    "apple",
    "microsoft",
];
