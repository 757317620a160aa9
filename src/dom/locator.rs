//! Element locators parsed from model or heuristic hints
//!
//! Hints come in three shapes: `text=Sign in` (quoted for a full match),
//! `button:has-text("Google")`, or plain CSS. `form:has(input)` and
//! `role=button[name="Continue"]` are accepted as well.

use serde::Serialize;
use std::fmt;

/// Clickable elements a text match is promoted to
pub const CLICKABLE_SELECTOR: &str = r#"button, a, [role="button"]"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Locator {
    /// First element matching a CSS selector
    Css { selector: String },
    /// Innermost element whose text contains (or, if `exact`, equals) `text`,
    /// promoted to its nearest clickable ancestor
    Text { text: String, exact: bool },
    /// First `selector` match whose text contains `text`
    HasText { selector: String, text: String },
    /// First `selector` match with a descendant matching `inner`
    Has { selector: String, inner: String },
}

impl Locator {
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css {
            selector: selector.into(),
        }
    }

    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Locator::Text {
            text: text.into(),
            exact: false,
        }
    }

    #[must_use]
    pub fn has_text(selector: impl Into<String>, text: impl Into<String>) -> Self {
        Locator::HasText {
            selector: selector.into(),
            text: text.into(),
        }
    }

    #[must_use]
    pub fn has(selector: impl Into<String>, inner: impl Into<String>) -> Self {
        Locator::Has {
            selector: selector.into(),
            inner: inner.into(),
        }
    }

    /// Clickable element whose text contains `text`
    #[must_use]
    pub fn clickable_text(text: impl Into<String>) -> Self {
        Self::has_text(CLICKABLE_SELECTOR, text)
    }

    /// Parse a locator hint; `None` for blank input
    #[must_use]
    pub fn parse_hint(hint: &str) -> Option<Self> {
        let hint = hint.trim().trim_matches('`').trim();
        if hint.is_empty() {
            return None;
        }

        if let Some(rest) = hint.strip_prefix("text=") {
            let rest = rest.trim();
            let (text, exact) = match unquote(rest) {
                Some(inner) => (inner, true),
                None => (rest, false),
            };
            if text.is_empty() {
                return None;
            }
            return Some(Locator::Text {
                text: text.to_string(),
                exact,
            });
        }

        if let Some(rest) = hint.strip_prefix("role=") {
            return Some(parse_role(rest));
        }

        if let Some(idx) = hint.rfind(":has-text(")
            && let Some(args) = hint[idx + ":has-text(".len()..].strip_suffix(')')
        {
            let text = unquote(args.trim()).unwrap_or(args.trim());
            return Some(Locator::HasText {
                selector: non_empty_selector(&hint[..idx]),
                text: text.to_string(),
            });
        }

        if let Some(idx) = hint.find(":has(")
            && let Some(inner) = hint[idx + ":has(".len()..].strip_suffix(')')
        {
            return Some(Locator::Has {
                selector: non_empty_selector(&hint[..idx]),
                inner: inner.trim().to_string(),
            });
        }

        Some(Locator::css(hint))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css { selector } => f.write_str(selector),
            Locator::Text { text, exact: true } => write!(f, "text=\"{text}\""),
            Locator::Text { text, exact: false } => write!(f, "text={text}"),
            Locator::HasText { selector, text } => write!(f, "{selector}:has-text(\"{text}\")"),
            Locator::Has { selector, inner } => write!(f, "{selector}:has({inner})"),
        }
    }
}

fn unquote(s: &str) -> Option<&str> {
    ['"', '\''].into_iter().find_map(|q| {
        s.strip_prefix(q)
            .and_then(|rest| rest.strip_suffix(q))
    })
}

fn non_empty_selector(selector: &str) -> String {
    match selector.trim() {
        "" => "*".to_string(),
        s => s.to_string(),
    }
}

fn parse_role(rest: &str) -> Locator {
    let (role, name) = match rest.split_once('[') {
        Some((role, attrs)) => {
            let name = attrs
                .trim_end_matches(']')
                .strip_prefix("name=")
                .map(|n| unquote(n.trim()).unwrap_or(n.trim()).to_string());
            (role.trim(), name)
        }
        None => (rest.trim(), None),
    };

    let selector = match role {
        "button" => r#"button, [role="button"], input[type="submit"]"#.to_string(),
        "link" => r#"a, [role="link"]"#.to_string(),
        other => format!(r#"[role="{other}"]"#),
    };

    match name {
        Some(name) if !name.is_empty() => Locator::HasText {
            selector,
            text: name,
        },
        _ => Locator::Css { selector },
    }
}

/// Collapse whitespace and lowercase, the comparison form for text matches
#[must_use]
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
