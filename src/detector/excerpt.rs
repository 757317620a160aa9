//! Relevance-ranked HTML excerpt for the model prompt
//!
//! Full pages routinely run to megabytes. The model only needs the markup
//! around authentication, so we pull fragments by priority and fall back to
//! the head of the body when nothing matches.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::utils::string_utils::safe_truncate_bytes;
use crate::utils::truncate_html;

/// Characters kept from the start of a matched container
const CONTAINER_SPAN_CHARS: usize = 2_000;

static FORM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<form\b[^>]*>.*?</form\s*>").expect("Invalid form regex"));

static PASSWORD_INPUT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<input\b[^>]*\btype\s*=\s*["']?password"#).expect("Invalid password regex")
});

static AUTH_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)log[-_\s]?in|sign[-_\s]?(in|on|up)|auth|session|account|sso")
        .expect("Invalid auth name regex")
});

static BUTTON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<button\b[^>]*>.*?</button\s*>").expect("Invalid button regex")
});

static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<a\b[^>]*>.*?</a\s*>").expect("Invalid link regex"));

/// Providers and phrases that make a button or link auth-relevant
static AUTH_VOCABULARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)sign[-_\s]?in|log[-_\s]?in|sign[-_\s]?up|continue with|sign in with|google|facebook|github|twitter|apple|microsoft|linkedin|okta|sso|passkey|magic[-_\s]?link|one[-_\s]?time|otp|verification code",
    )
    .expect("Invalid auth vocabulary regex")
});

static AUTH_CONTAINER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)<(?:div|section|aside|dialog|main)\b[^>]*\b(?:class|id|data-testid)\s*=\s*["'][^"']*(?:login|signin|sign-in|auth|oauth|social|sso)[^"']*["'][^>]*>"#,
    )
    .expect("Invalid auth container regex")
});

static WEBAUTHN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<[a-z][^>]*(?:webauthn|passkey|publickey|navigator\.credentials)[^>]*>")
        .expect("Invalid webauthn regex")
});

static SCRIPT_OR_STYLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
        .expect("Invalid script/style regex")
});

static BODY_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<body\b[^>]*>").expect("Invalid body regex"));

fn opening_tag(fragment: &str) -> &str {
    fragment.find('>').map_or(fragment, |end| &fragment[..=end])
}

/// Fragments in priority order, duplicates included
fn candidate_fragments(html: &str) -> Vec<String> {
    let mut fragments = Vec::new();

    let forms: Vec<&str> = FORM.find_iter(html).map(|m| m.as_str()).collect();
    fragments.extend(
        forms
            .iter()
            .filter(|form| PASSWORD_INPUT.is_match(form))
            .map(|form| (*form).to_string()),
    );
    fragments.extend(
        forms
            .iter()
            .filter(|form| AUTH_NAME.is_match(opening_tag(form)))
            .map(|form| (*form).to_string()),
    );

    for pattern in [&*BUTTON, &*LINK] {
        fragments.extend(
            pattern
                .find_iter(html)
                .map(|m| m.as_str())
                .filter(|el| AUTH_VOCABULARY.is_match(el))
                .map(str::to_string),
        );
    }

    fragments.extend(
        AUTH_CONTAINER
            .find_iter(html)
            .map(|m| truncate_html(&html[m.start()..], CONTAINER_SPAN_CHARS)),
    );

    fragments.extend(WEBAUTHN.find_iter(html).map(|m| m.as_str().to_string()));
    fragments
}

/// Reduce `html` to at most `max_bytes` of auth-relevant markup
///
/// When the matched fragments add up to less than `min_bytes`, the head of
/// the body (scripts and styles removed) is used instead.
#[must_use]
pub fn build_excerpt(html: &str, max_bytes: usize, min_bytes: usize) -> String {
    let mut kept: Vec<String> = Vec::new();
    for fragment in candidate_fragments(html) {
        let fragment = fragment.trim();
        if fragment.is_empty() || kept.iter().any(|k| k.contains(fragment)) {
            continue;
        }
        kept.push(fragment.to_string());
    }

    let joined = kept.join("\n");
    let excerpt = safe_truncate_bytes(&joined, max_bytes);
    if excerpt.len() >= min_bytes {
        return excerpt.to_string();
    }

    body_head(html, max_bytes)
}

fn body_head(html: &str, max_bytes: usize) -> String {
    let body = BODY_OPEN.find(html).map_or(html, |m| &html[m.end()..]);
    let stripped = SCRIPT_OR_STYLE.replace_all(body, "");
    safe_truncate_bytes(stripped.trim(), max_bytes).to_string()
}
