//! UTF-8-safe string truncation utilities
//!
//! Slicing helpers that respect character boundaries so multi-byte
//! characters in scraped pages never cause a panic.

/// Safely truncate a string to a maximum number of CHARACTERS (not bytes).
///
/// # Examples
/// ```
/// # use kodegen_tools_authdetect::utils::string_utils::safe_truncate_chars;
/// assert_eq!(safe_truncate_chars("Hello, World!", 5), "Hello");
/// assert_eq!(safe_truncate_chars("Hi", 100), "Hi");
/// ```
#[inline]
pub fn safe_truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        None => s,
        Some((byte_idx, _)) => &s[..byte_idx],
    }
}

/// Truncate to at most `max_bytes` bytes, backing off to the previous
/// character boundary.
///
/// # Examples
/// ```
/// # use kodegen_tools_authdetect::utils::string_utils::safe_truncate_bytes;
/// assert_eq!(safe_truncate_bytes("héllo", 2), "h");
/// assert_eq!(safe_truncate_bytes("héllo", 3), "hé");
/// ```
#[inline]
pub fn safe_truncate_bytes(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
