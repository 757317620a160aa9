//! Login modal reveal
//!
//! Many sites keep their sign-in form behind a header button that opens a
//! dialog. Before the DOM is serialized we click the most likely triggers,
//! one at a time, until a visible modal appears.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::AuthDetectConfig;
use crate::dom::{DomProbe, Locator};

/// Selectors that identify an open modal
pub const MODAL_SELECTORS: &[&str] = &[
    r#"[role="dialog"]"#,
    r#"[aria-modal="true"]"#,
    ".modal",
    ".modal-dialog",
    r#"[class*="modal"]"#,
    r#"[class*="Modal"]"#,
    r#"[class*="dialog"]"#,
    r#"[data-testid*="modal"]"#,
];

/// Elements that can open a dialog without leaving the document
///
/// Anchors count only without an `href` or with a fragment one; following a
/// real link would swap the page out from under the concurrent extraction.
pub const TRIGGER_SELECTOR: &str =
    r##"button, [role="button"]:not(a), a:not([href]), a[href^="#"]"##;

/// `compound` restricted to elements that stay on the page
fn in_page(compound: &str) -> Locator {
    Locator::css(format!(
        r##"{compound}:not(a), a:not([href]){compound}, a[href^="#"]{compound}"##
    ))
}

/// Trigger candidates, most likely first
#[must_use]
pub fn modal_triggers() -> Vec<Locator> {
    let by_text = ["Sign in", "Log in", "Login"]
        .into_iter()
        .map(|text| Locator::has_text(TRIGGER_SELECTOR, text));
    let by_attribute = [
        r#"[data-testid*="login"]"#,
        r#"[data-testid*="signin"]"#,
        r#"[aria-label*="Sign in"]"#,
        r#"[aria-label*="Log in"]"#,
        ".login-button",
        ".signin-button",
        ".sign-in",
        "#login",
    ]
    .into_iter()
    .map(in_page);
    by_text.chain(by_attribute).collect()
}

#[derive(Debug, Clone, Copy)]
pub struct ModalTimings {
    /// Wall-clock budget for the whole scan
    pub budget: Duration,
    pub click_timeout: Duration,
    /// Pause between a click and the visibility check
    pub settle: Duration,
}

impl From<&AuthDetectConfig> for ModalTimings {
    fn from(config: &AuthDetectConfig) -> Self {
        Self {
            budget: config.modal_budget(),
            click_timeout: config.modal_click_timeout(),
            settle: config.modal_settle(),
        }
    }
}

enum TriggerOutcome {
    Revealed,
    NoModal,
    Missing,
}

async fn try_trigger(dom: &dyn DomProbe, trigger: &Locator, timings: ModalTimings) -> anyhow::Result<TriggerOutcome> {
    let clicked = tokio::time::timeout(timings.click_timeout, dom.click(trigger))
        .await
        .map_err(|_| anyhow::anyhow!("click timed out"))??;
    if !clicked {
        return Ok(TriggerOutcome::Missing);
    }

    tokio::time::sleep(timings.settle).await;

    if dom.any_visible(MODAL_SELECTORS).await? {
        Ok(TriggerOutcome::Revealed)
    } else {
        Ok(TriggerOutcome::NoModal)
    }
}

/// Click through the trigger list until a modal is visible
///
/// Returns `true` only when a modal was confirmed visible. Trigger failures
/// are skipped and the scan gives up once the budget is spent.
pub async fn reveal_modal(dom: &dyn DomProbe, timings: ModalTimings, request_id: &str) -> bool {
    let scan = async {
        for trigger in modal_triggers() {
            match try_trigger(dom, &trigger, timings).await {
                Ok(TriggerOutcome::Revealed) => {
                    info!(request_id = %request_id, trigger = %trigger, "Login modal revealed");
                    return true;
                }
                Ok(TriggerOutcome::NoModal) => {
                    debug!(request_id = %request_id, trigger = %trigger, "Clicked trigger, no modal");
                }
                Ok(TriggerOutcome::Missing) => {}
                Err(e) => {
                    debug!(request_id = %request_id, trigger = %trigger, "Modal trigger failed: {e}");
                }
            }
        }
        false
    };

    let started = Instant::now();
    match tokio::time::timeout(timings.budget, scan).await {
        Ok(revealed) => revealed,
        Err(_) => {
            debug!(
                request_id = %request_id,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Modal scan budget exhausted"
            );
            false
        }
    }
}
