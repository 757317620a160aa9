use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

use super::locator::Locator;

const POLL_START: Duration = Duration::from_millis(50);
const POLL_MAX: Duration = Duration::from_millis(500);

/// Element queries against a rendered page
///
/// Implemented over a live CDP page and over static HTML. Errors mean the
/// query itself could not run; an element that is simply absent is `Ok(None)`.
#[async_trait]
pub trait DomProbe: Send + Sync {
    /// Outer HTML of the element `locator` resolves to, if attached
    async fn outer_html(&self, locator: &Locator) -> Result<Option<String>>;

    /// Click the element `locator` resolves to; `false` if it is absent
    async fn click(&self, locator: &Locator) -> Result<bool>;

    /// Whether any element matching one of `selectors` is rendered visibly
    async fn any_visible(&self, selectors: &[&str]) -> Result<bool>;

    /// Poll until the element attaches or `timeout` elapses
    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<Option<String>> {
        let deadline = Instant::now() + timeout;
        let mut delay = POLL_START;
        loop {
            if let Some(html) = self.outer_html(locator).await? {
                return Ok(Some(html));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(delay.min(deadline - now)).await;
            delay = (delay * 2).min(POLL_MAX);
        }
    }
}
