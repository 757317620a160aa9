//! Snippet resolution against the live page
//!
//! Each proposed component's locator hint is resolved to real outer HTML.
//! Components are never dropped here: a locator that does not resolve goes
//! through the fallback cascade, and anything else gets a placeholder.

use futures::future::join_all;
use std::time::Duration;
use tracing::{debug, warn};

use super::fallback::fallback_snippet;
use super::types::AuthComponent;
use crate::config::AuthDetectConfig;
use crate::dom::{DomProbe, Locator};
use crate::utils::truncate_html;

#[derive(Debug, Clone, Copy)]
pub struct SnippetSettings {
    /// Deadline for resolving every component of one result
    pub batch_timeout: Duration,
    /// How long a stated locator may take to attach
    pub locator_wait: Duration,
    /// Per-strategy limit inside the fallback cascade
    pub strategy_timeout: Duration,
    /// Budget across all OAuth providers in the cascade
    pub oauth_budget: Duration,
    pub max_chars: usize,
}

impl From<&AuthDetectConfig> for SnippetSettings {
    fn from(config: &AuthDetectConfig) -> Self {
        Self {
            batch_timeout: config.snippet_batch_timeout(),
            locator_wait: config.locator_wait(),
            strategy_timeout: config.oauth_strategy_timeout(),
            oauth_budget: config.oauth_fallback_budget(),
            max_chars: config.max_snippet_chars(),
        }
    }
}

/// HTML comment standing in for a snippet that could not be extracted
#[must_use]
pub fn placeholder(message: &str) -> String {
    let mut text = message.to_string();
    while text.contains("--") {
        text = text.replace("--", "- -");
    }
    format!("<!-- {text} -->")
}

async fn resolve_snippet(
    dom: &dyn DomProbe,
    component: &AuthComponent,
    settings: SnippetSettings,
    request_id: &str,
) -> String {
    let kind = component.kind;
    let Some(locator) = component
        .details
        .locator_hint
        .as_deref()
        .and_then(Locator::parse_hint)
    else {
        return placeholder(&format!("{kind} component detected; no locator provided"));
    };

    match dom.wait_for(&locator, settings.locator_wait).await {
        Ok(Some(html)) => {
            debug!(request_id = %request_id, %kind, %locator, "Locator resolved");
            truncate_html(&html, settings.max_chars)
        }
        Ok(None) => {
            debug!(request_id = %request_id, %kind, %locator, "Locator missed, trying fallbacks");
            fallback_snippet(dom, component, settings, request_id).await
        }
        Err(e) => {
            warn!(request_id = %request_id, %kind, %locator, "Snippet extraction failed: {e:#}");
            placeholder(&format!("{kind} component detected but extraction failed: {e}"))
        }
    }
}

/// Resolve and attach a snippet to every component
///
/// The whole batch races `batch_timeout`; when it loses, every component
/// gets a timeout placeholder instead.
pub async fn attach_snippets(
    dom: &dyn DomProbe,
    components: Vec<AuthComponent>,
    settings: SnippetSettings,
    request_id: &str,
) -> Vec<AuthComponent> {
    if components.is_empty() {
        return components;
    }

    let batch = join_all(
        components
            .iter()
            .map(|component| resolve_snippet(dom, component, settings, request_id)),
    );

    let outcome = tokio::time::timeout(settings.batch_timeout, batch).await;
    match outcome {
        Ok(snippets) => components
            .into_iter()
            .zip(snippets)
            .map(|(component, snippet)| component.with_snippet(snippet))
            .collect(),
        Err(_) => {
            warn!(
                request_id = %request_id,
                components = components.len(),
                timeout_ms = settings.batch_timeout.as_millis() as u64,
                "Snippet extraction timed out"
            );
            let note = format!(
                "component detected; snippet extraction timed out after {}ms",
                settings.batch_timeout.as_millis()
            );
            components
                .into_iter()
                .map(|component| {
                    let snippet = placeholder(&format!("{} {note}", component.kind));
                    component.with_snippet(snippet)
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_a_safe_comment() {
        assert_eq!(placeholder("a -- b"), "<!-- a - - b -->");
    }

    #[test]
    fn placeholder_breaks_up_dash_runs() {
        assert_eq!(placeholder("a --- b"), "<!-- a - - - b -->");
        let long = placeholder("net::ERR------FAILED");
        assert!(!long["<!--".len()..long.len() - "-->".len()].contains("--"));
    }
}
