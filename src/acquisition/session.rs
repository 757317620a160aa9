//! Live browsing handles that outlive page acquisition
//!
//! A successful acquisition leaves the page and its context open so
//! detection can query the live DOM. Whoever holds the `LiveSession` owns
//! those handles and releases them exactly once by consuming it.

use std::sync::Arc;
use tracing::{debug, warn};

use super::page::{PageHost, PageOf, RenderedPage};
use crate::browser_pool::{BrowserLauncher, BrowserPool, ChromeLauncher, PooledContext};

pub type ChromePool = BrowserPool<ChromeLauncher>;

/// Page and context created so far; either may be absent mid-acquisition
pub(crate) struct SessionParts<L>
where
    L: BrowserLauncher,
    L::Browser: PageHost,
{
    pub(crate) page: Option<PageOf<L>>,
    pub(crate) context: Option<PooledContext<L::Browser>>,
}

impl<L> Default for SessionParts<L>
where
    L: BrowserLauncher,
    L::Browser: PageHost,
{
    fn default() -> Self {
        Self {
            page: None,
            context: None,
        }
    }
}

impl<L> SessionParts<L>
where
    L: BrowserLauncher,
    L::Browser: PageHost,
{
    fn is_empty(&self) -> bool {
        self.page.is_none() && self.context.is_none()
    }

    /// Close the page and release the context, each attempted independently
    pub(crate) async fn release(&mut self, pool: &BrowserPool<L>, request_id: &str) {
        if let Some(mut page) = self.page.take()
            && let Err(e) = page.close().await
        {
            warn!(request_id = %request_id, "Failed to close page: {e:#}");
        }
        if let Some(context) = self.context.take() {
            pool.release_context(context).await;
        }
    }
}

/// Caller-owned page and context from a successful acquisition
pub struct LiveSession<L = ChromeLauncher>
where
    L: BrowserLauncher,
    L::Browser: PageHost,
{
    pool: Arc<BrowserPool<L>>,
    parts: SessionParts<L>,
    dom: <PageOf<L> as RenderedPage>::Dom,
    request_id: String,
}

impl<L> LiveSession<L>
where
    L: BrowserLauncher,
    L::Browser: PageHost,
{
    pub(crate) fn new(
        pool: Arc<BrowserPool<L>>,
        parts: SessionParts<L>,
        dom: <PageOf<L> as RenderedPage>::Dom,
        request_id: &str,
    ) -> Self {
        Self {
            pool,
            parts,
            dom,
            request_id: request_id.to_string(),
        }
    }

    /// DOM queries against the live page
    #[must_use]
    pub fn dom(&self) -> &<PageOf<L> as RenderedPage>::Dom {
        &self.dom
    }

    /// Close the page and release the context
    pub async fn release(mut self) {
        self.parts.release(&self.pool, &self.request_id).await;
        debug!(request_id = %self.request_id, "Live session released");
    }
}

impl<L> Drop for LiveSession<L>
where
    L: BrowserLauncher,
    L::Browser: PageHost,
{
    fn drop(&mut self) {
        if self.parts.is_empty() {
            return;
        }
        warn!(request_id = %self.request_id, "Live session dropped without release");

        let mut parts = std::mem::take(&mut self.parts);
        let pool = Arc::clone(&self.pool);
        let request_id = std::mem::take(&mut self.request_id);
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                parts.release(&pool, &request_id).await;
            });
        }
    }
}
