//! Type-specific fallback cascade
//!
//! When a stated locator does not resolve we retry with locators derived
//! from the component type. The first hit wins.

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use super::snippet::{SnippetSettings, placeholder};
use super::types::{AuthComponent, ComponentType};
use crate::dom::{DomProbe, Locator};
use crate::utils::{OAUTH_PROVIDERS, truncate_html};

const PASSWORD_INPUT: &str = r#"input[type="password"]"#;

async fn try_locator(dom: &dyn DomProbe, locator: &Locator, limit: Duration) -> Option<String> {
    match tokio::time::timeout(limit, dom.wait_for(locator, limit)).await {
        Ok(Ok(found)) => found,
        Ok(Err(e)) => {
            debug!(%locator, "Fallback locator failed: {e:#}");
            None
        }
        Err(_) => None,
    }
}

/// First locator in `candidates` that resolves, tried in order
async fn first_hit(dom: &dyn DomProbe, candidates: &[Locator], limit: Duration) -> Option<(String, String)> {
    for locator in candidates {
        if let Some(html) = try_locator(dom, locator, limit).await {
            return Some((locator.to_string(), html));
        }
    }
    None
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn oauth_strategies(provider: &str) -> [Locator; 3] {
    let display = capitalize(provider);
    [
        Locator::clickable_text(display.clone()),
        Locator::text(format!("Sign in with {display}")),
        Locator::css(format!(r#"[data-provider="{provider}"]"#)),
    ]
}

fn traditional_strategies() -> Vec<Locator> {
    vec![
        Locator::has("form", PASSWORD_INPUT),
        Locator::css(r#"form[action*="login"]"#),
        Locator::css(r#"form[action*="signin"]"#),
        Locator::css(r#"form[action*="auth"]"#),
    ]
}

fn passkey_strategies() -> Vec<Locator> {
    vec![
        Locator::clickable_text("passkey"),
        Locator::css(r#"input[autocomplete*="webauthn"]"#),
    ]
}

fn magic_link_strategies() -> Vec<Locator> {
    vec![
        Locator::clickable_text("magic link"),
        Locator::clickable_text("email me a link"),
        Locator::clickable_text("email link"),
    ]
}

fn otp_strategies() -> Vec<Locator> {
    vec![
        Locator::css(r#"input[autocomplete="one-time-code"]"#),
        Locator::clickable_text("send code"),
        Locator::clickable_text("one-time code"),
    ]
}

fn webauthn_strategies() -> Vec<Locator> {
    vec![
        Locator::css(r#"[data-webauthn], [class*="webauthn"]"#),
        Locator::clickable_text("security key"),
    ]
}

/// Method-specific locators first, then every generic passwordless locator
fn passwordless_strategies(method: Option<&str>) -> Vec<Locator> {
    let method = method.map(str::to_lowercase).unwrap_or_default();
    let mut ordered = Vec::new();

    if method.contains("passkey") || method.contains("webauthn") {
        ordered.extend(passkey_strategies());
    } else if method.contains("magic") || method.contains("link") {
        ordered.extend(magic_link_strategies());
    } else if method.contains("otp") || method.contains("code") || method.contains("sms") {
        ordered.extend(otp_strategies());
    }

    for locator in passkey_strategies()
        .into_iter()
        .chain(magic_link_strategies())
        .chain(otp_strategies())
        .chain(webauthn_strategies())
    {
        if !ordered.contains(&locator) {
            ordered.push(locator);
        }
    }
    ordered
}

async fn oauth_fallback(dom: &dyn DomProbe, component: &AuthComponent, settings: SnippetSettings) -> String {
    let named = component.providers();
    let providers: Vec<String> = if named.is_empty() {
        OAUTH_PROVIDERS.iter().map(|p| (*p).to_string()).collect()
    } else {
        named
    };

    let started = Instant::now();
    for provider in &providers {
        for locator in oauth_strategies(provider) {
            let remaining = settings.oauth_budget.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                return oauth_exhausted(&providers, started);
            }
            if let Some(html) = try_locator(dom, &locator, settings.strategy_timeout.min(remaining)).await {
                debug!(%provider, %locator, "OAuth fallback hit");
                return truncate_html(&html, settings.max_chars);
            }
        }
    }
    oauth_exhausted(&providers, started)
}

fn oauth_exhausted(providers: &[String], started: Instant) -> String {
    placeholder(&format!(
        "oauth component detected; no element found for providers [{}] after {}ms",
        providers.join(", "),
        started.elapsed().as_millis()
    ))
}

/// Snippet for a component whose stated locator did not resolve
pub async fn fallback_snippet(
    dom: &dyn DomProbe,
    component: &AuthComponent,
    settings: SnippetSettings,
    request_id: &str,
) -> String {
    let limit = settings.strategy_timeout;
    let hit = match component.kind {
        ComponentType::OAuth => return oauth_fallback(dom, component, settings).await,
        ComponentType::Traditional => first_hit(dom, &traditional_strategies(), limit).await,
        ComponentType::Passwordless => {
            let strategies = passwordless_strategies(component.details.method.as_deref());
            first_hit(dom, &strategies, limit).await
        }
    };

    match hit {
        Some((locator, html)) => {
            debug!(request_id = %request_id, kind = %component.kind, %locator, "Fallback hit");
            truncate_html(&html, settings.max_chars)
        }
        None => placeholder(&format!(
            "{} component detected; fallback failed to locate an element",
            component.kind
        )),
    }
}
