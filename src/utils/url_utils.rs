//! URL validation and cache-key normalization.

use url::Url;

/// Check if a URL is valid for detection (absolute http or https)
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    // Skip data URLs, javascript URLs, and other non-http schemes
    if url.starts_with("data:") || url.starts_with("javascript:") || url.starts_with("mailto:") {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some(),
        Err(_) => false,
    }
}

/// Host with any leading `www.` removed, lowercased.
///
/// Returns `None` when the input does not parse or has no host.
#[must_use]
pub fn cache_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    parsed.host_str().map(strip_www)
}

fn strip_www(host: &str) -> String {
    let lowered = host.to_ascii_lowercase();
    let stripped = lowered.trim_start_matches("www.");
    if stripped.is_empty() {
        lowered
    } else {
        stripped.to_string()
    }
}

/// Normalize a URL into a cache key.
///
/// The key keeps scheme, host (without `www.`), explicit port and path.
/// Query string, fragment and trailing slashes are dropped, except the
/// slash of a bare root path. Unparseable input is keyed by its trimmed text.
///
/// # Examples
/// ```
/// # use kodegen_tools_authdetect::utils::url_utils::normalize_cache_key;
/// assert_eq!(
///     normalize_cache_key("https://www.EXAMPLE.com/a/"),
///     normalize_cache_key("https://example.com/a?x=1"),
/// );
/// assert_eq!(normalize_cache_key("https://example.com"), "https://example.com/");
/// ```
#[must_use]
pub fn normalize_cache_key(url: &str) -> String {
    let trimmed = url.trim();
    let Ok(parsed) = Url::parse(trimmed) else {
        return trimmed.to_string();
    };
    let Some(host) = parsed.host_str() else {
        return trimmed.to_string();
    };

    let host = strip_www(host);
    let path = match parsed.path().trim_end_matches('/') {
        "" => "/",
        trimmed_path => trimmed_path,
    };
    let port = parsed.port().map(|p| format!(":{p}")).unwrap_or_default();

    format!("{}://{host}{port}{path}", parsed.scheme())
}
