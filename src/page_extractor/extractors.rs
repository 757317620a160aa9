//! Page content extraction over a live CDP page
//!
//! Navigation, the readiness wait and the individual extraction steps the
//! acquirer runs concurrently once a page has settled.

use anyhow::{Context, Result};
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams, NavigateParams,
};
use serde::Deserialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::js_scripts::{ACCESSIBILITY_SCRIPT, READINESS_SCRIPT, SHADOW_DOM_SCRIPT};
use crate::error::AuthDetectError;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Readiness {
    ready_state: String,
    resource_count: u64,
    body_exists: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ShadowContent {
    pub html: String,
    pub hosts: usize,
}

#[derive(Debug, Default, Deserialize)]
struct AccessibilityScan {
    signals: Vec<String>,
}

/// Readiness wait tuning
#[derive(Debug, Clone, Copy)]
pub struct ReadinessTimings {
    pub network_idle_timeout: Duration,
    pub quiet_window: Duration,
    pub settle_after_idle: Duration,
    pub settle_after_busy: Duration,
}

async fn readiness(page: &Page) -> Result<Readiness> {
    page.evaluate(READINESS_SCRIPT)
        .await
        .context("Failed to evaluate readiness script")?
        .into_value::<Readiness>()
        .context("Failed to parse readiness result")
}

/// Navigate and wait until the document has parsed (`domcontentloaded`)
pub async fn navigate(page: &Page, url: &str, timeout: Duration) -> crate::Result<()> {
    tokio::time::timeout(timeout, navigate_until_parsed(page, url))
        .await
        .map_err(|_| AuthDetectError::Timeout {
            operation: "Navigation",
            after: timeout,
        })?
}

async fn navigate_until_parsed(page: &Page, url: &str) -> crate::Result<()> {
    let response = page
        .execute(NavigateParams::new(url))
        .await
        .map_err(|e| AuthDetectError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    if let Some(error_text) = response.result.error_text.clone() {
        return Err(AuthDetectError::Navigation {
            url: url.to_string(),
            message: error_text,
        });
    }

    loop {
        match readiness(page).await {
            Ok(state) if state.ready_state != "loading" => return Ok(()),
            Ok(_) => {}
            // Context is torn down while the new document commits
            Err(e) => debug!("Readiness probe during navigation failed: {e}"),
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Best-effort wait for client-rendered pages to hydrate
///
/// Polls until the document is complete and the resource-timing count holds
/// still for the quiet window, then sleeps a settle delay that is longer
/// when that state was never reached. Returns whether network idle was seen.
pub async fn wait_for_page_load(page: &Page, timings: ReadinessTimings, request_id: &str) -> bool {
    let start = Instant::now();
    let deadline = start + timings.network_idle_timeout;
    let mut last_count: Option<u64> = None;
    let mut stable_since = start;

    let idle = loop {
        let now = Instant::now();
        if now >= deadline {
            break false;
        }

        match readiness(page).await {
            Ok(state) if state.ready_state == "complete" && state.body_exists => {
                if last_count == Some(state.resource_count) {
                    if now.duration_since(stable_since) >= timings.quiet_window {
                        break true;
                    }
                } else {
                    last_count = Some(state.resource_count);
                    stable_since = now;
                }
            }
            Ok(_) => last_count = None,
            Err(e) => debug!(request_id = %request_id, "Readiness check failed: {e}"),
        }

        tokio::time::sleep(POLL_INTERVAL).await;
    };

    let settle = if idle {
        debug!(
            request_id = %request_id,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Network idle reached"
        );
        timings.settle_after_idle
    } else {
        warn!(
            request_id = %request_id,
            timeout_ms = timings.network_idle_timeout.as_millis() as u64,
            "Network idle not reached, continuing"
        );
        timings.settle_after_busy
    };
    tokio::time::sleep(settle).await;
    idle
}

/// Serialized DOM of the main document
pub async fn extract_html(page: &Page) -> Result<String> {
    page.content().await.context("Failed to serialize page DOM")
}

/// Open shadow roots, serialized; empty when the page has none
pub async fn extract_shadow_dom(page: &Page) -> Result<ShadowContent> {
    page.evaluate(SHADOW_DOM_SCRIPT)
        .await
        .context("Failed to execute shadow DOM script")?
        .into_value::<ShadowContent>()
        .context("Failed to parse shadow DOM result")
}

/// Accessibility-tree signals that hint at authentication UI
pub async fn extract_accessibility_signals(page: &Page) -> Result<Vec<String>> {
    let scan = page
        .evaluate(ACCESSIBILITY_SCRIPT)
        .await
        .context("Failed to execute accessibility script")?
        .into_value::<AccessibilityScan>()
        .context("Failed to parse accessibility result")?;
    Ok(scan.signals)
}

pub async fn extract_title(page: &Page) -> Result<Option<String>> {
    let title = page.get_title().await.context("Failed to read page title")?;
    Ok(title.filter(|t| !t.trim().is_empty()))
}

/// Viewport JPEG, bounded by `timeout`; `None` on any failure
pub async fn capture_screenshot(
    page: &Page,
    quality: i64,
    timeout: Duration,
    request_id: &str,
) -> Option<Vec<u8>> {
    let params = CaptureScreenshotParams {
        format: Some(CaptureScreenshotFormat::Jpeg),
        quality: Some(quality),
        ..Default::default()
    };

    match tokio::time::timeout(timeout, page.screenshot(params)).await {
        Ok(Ok(bytes)) => {
            debug!(request_id = %request_id, bytes = bytes.len(), "Screenshot captured");
            Some(bytes)
        }
        Ok(Err(e)) => {
            warn!(request_id = %request_id, "Screenshot failed: {e}");
            None
        }
        Err(_) => {
            warn!(
                request_id = %request_id,
                timeout_ms = timeout.as_millis() as u64,
                "Screenshot timed out"
            );
            None
        }
    }
}

/// Append shadow-root markup under a marker so detection sees one document
#[must_use]
pub fn merge_shadow_html(html: String, shadow_html: &str, marker: &str) -> String {
    if shadow_html.trim().is_empty() {
        return html;
    }
    let mut merged = html;
    merged.reserve(marker.len() + shadow_html.len() + 2);
    merged.push('\n');
    merged.push_str(marker);
    merged.push('\n');
    merged.push_str(shadow_html);
    merged
}
