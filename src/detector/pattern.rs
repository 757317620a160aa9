//! Heuristic detection without a model
//!
//! Two checks run concurrently: a password-bearing form and a scan for
//! buttons or links naming a well-known identity provider. Passwordless
//! flows are left to the model path.

use futures::future::join_all;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;

use super::types::{AuthComponent, ComponentDetails, ComponentType};
use crate::dom::{DomProbe, Locator};
use crate::utils::{OAUTH_PROVIDERS, truncate_html};

const PASSWORD_INPUT: &str = r#"input[type="password"]"#;
const EMAIL_INPUT: &str = r#"input[type="email"]"#;

/// `email` and/or `password`, in that order, by typed inputs present
fn classify_fields(form_html: &str) -> Vec<String> {
    let fragment = Html::parse_fragment(form_html);
    [("email", EMAIL_INPUT), ("password", PASSWORD_INPUT)]
        .into_iter()
        .filter(|(_, selector)| {
            Selector::parse(selector).is_ok_and(|s| fragment.select(&s).next().is_some())
        })
        .map(|(field, _)| field.to_string())
        .collect()
}

/// Outer HTML for `locator`, treating errors and timeouts as a miss
async fn lookup(dom: &dyn DomProbe, locator: &Locator, limit: Duration, request_id: &str) -> Option<String> {
    match tokio::time::timeout(limit, dom.outer_html(locator)).await {
        Ok(Ok(found)) => found,
        Ok(Err(e)) => {
            debug!(request_id = %request_id, %locator, "Pattern lookup failed: {e:#}");
            None
        }
        Err(_) => {
            debug!(
                request_id = %request_id,
                %locator,
                timeout_ms = limit.as_millis() as u64,
                "Pattern lookup timed out"
            );
            None
        }
    }
}

async fn password_form(dom: &dyn DomProbe, max_chars: usize, limit: Duration, request_id: &str) -> Option<AuthComponent> {
    let locator = Locator::has("form", PASSWORD_INPUT);
    let html = lookup(dom, &locator, limit, request_id).await?;

    let details = ComponentDetails {
        fields: Some(classify_fields(&html)),
        locator_hint: Some(locator.to_string()),
        ..Default::default()
    };
    Some(AuthComponent::new(ComponentType::Traditional, details).with_snippet(truncate_html(&html, max_chars)))
}

async fn provider_buttons(dom: &dyn DomProbe, max_chars: usize, limit: Duration, request_id: &str) -> Option<AuthComponent> {
    let lookups = OAUTH_PROVIDERS.iter().map(|provider| async move {
        let locator = Locator::clickable_text(*provider);
        let Some(html) = lookup(dom, &locator, limit, request_id).await else {
            return None;
        };
        Some((*provider, locator, html))
    });
    let found: Vec<_> = join_all(lookups).await.into_iter().flatten().collect();

    let (_, first_locator, first_html) = found.first()?;
    let details = ComponentDetails {
        providers: Some(found.iter().map(|(provider, _, _)| (*provider).to_string()).collect()),
        locator_hint: Some(first_locator.to_string()),
        ..Default::default()
    };
    Some(AuthComponent::new(ComponentType::OAuth, details).with_snippet(truncate_html(first_html, max_chars)))
}

/// Zero to two components: `traditional` and/or `oauth`
///
/// Each lookup is bounded by `lookup_timeout`; one that runs out counts as
/// not found.
pub async fn detect_patterns(
    dom: &dyn DomProbe,
    max_chars: usize,
    lookup_timeout: Duration,
    request_id: &str,
) -> Vec<AuthComponent> {
    let (traditional, oauth) = tokio::join!(
        password_form(dom, max_chars, lookup_timeout, request_id),
        provider_buttons(dom, max_chars, lookup_timeout, request_id),
    );
    let components: Vec<AuthComponent> = traditional.into_iter().chain(oauth).collect();
    debug!(request_id = %request_id, found = components.len(), "Pattern detection complete");
    components
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_are_classified_in_order() {
        let fields = classify_fields(
            r#"<form><input type="password" name="pw"><input type="email" name="mail"></form>"#,
        );
        assert_eq!(fields, vec!["email", "password"]);
    }

    #[test]
    fn username_only_form_reports_password() {
        let fields = classify_fields(r#"<form><input name="user"><input type="password"></form>"#);
        assert_eq!(fields, vec!["password"]);
    }
}
