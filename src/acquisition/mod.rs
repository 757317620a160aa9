//! Page acquisition
//!
//! Turns a URL into rendered markup plus the live handles detection needs:
//! context, page, navigation, readiness wait, then concurrent content
//! extraction and screenshot capture, all under one overall deadline.

pub mod page;
pub mod session;

use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::browser_pool::{BrowserLauncher, BrowserPool, ChromeLauncher};
use crate::config::AuthDetectConfig;
use crate::error::{AuthDetectError, Result};
use crate::page_extractor::{
    ModalTimings, ReadinessTimings, ShadowContent, merge_shadow_html, reveal_modal,
};
use crate::utils::SHADOW_DOM_MARKER;

pub use page::{PageHost, PageOf, RenderedPage};
pub use session::{ChromePool, LiveSession};
use session::SessionParts;

#[derive(Debug, Clone, Default)]
pub struct ScrapeMetadata {
    pub has_shadow_dom: bool,
    pub modal_triggered: bool,
    pub network_idle: bool,
    pub has_auth_accessibility_signals: bool,
    pub accessibility_signals: Vec<String>,
}

/// Rendered page plus the live session that must be released
pub struct ScrapedPage<L = ChromeLauncher>
where
    L: BrowserLauncher,
    L::Browser: PageHost,
{
    pub url: String,
    pub html: String,
    pub title: Option<String>,
    /// JPEG bytes when capture succeeded
    pub screenshot: Option<Vec<u8>>,
    pub metadata: ScrapeMetadata,
    pub session: LiveSession<L>,
}

struct Extracted {
    html: String,
    title: Option<String>,
    screenshot: Option<Vec<u8>>,
    metadata: ScrapeMetadata,
}

struct Content {
    html: String,
    title: Option<String>,
    shadow: ShadowContent,
    modal_triggered: bool,
    signals: Vec<String>,
}

pub struct PageAcquirer<L: BrowserLauncher = ChromeLauncher> {
    pool: Arc<BrowserPool<L>>,
    config: Arc<AuthDetectConfig>,
}

impl<L> PageAcquirer<L>
where
    L: BrowserLauncher,
    L::Browser: PageHost,
{
    pub fn new(pool: Arc<BrowserPool<L>>, config: Arc<AuthDetectConfig>) -> Self {
        Self { pool, config }
    }

    pub fn pool(&self) -> &Arc<BrowserPool<L>> {
        &self.pool
    }

    /// Load `url` and extract its content
    ///
    /// On success the caller owns `ScrapedPage::session` and must release it.
    /// On failure, including the overall timeout, everything created so far
    /// has already been cleaned up.
    pub async fn acquire(&self, url: &str, request_id: &str) -> Result<ScrapedPage<L>> {
        let started = Instant::now();
        let limit = self.config.scrape_timeout();
        let mut parts = SessionParts::default();

        let outcome = match tokio::time::timeout(limit, self.run(url, request_id, &mut parts)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(AuthDetectError::Timeout {
                operation: "Page acquisition",
                after: limit,
            }),
        };

        let extracted = match outcome {
            Ok(extracted) => extracted,
            Err(e) => {
                warn!(request_id = %request_id, url = %url, error = %e, "Page acquisition failed");
                parts.release(&self.pool, request_id).await;
                return Err(e);
            }
        };
        let Some(dom) = parts.page.as_ref().map(RenderedPage::dom) else {
            parts.release(&self.pool, request_id).await;
            return Err(AuthDetectError::Internal("Page closed during acquisition".to_string()));
        };

        info!(
            request_id = %request_id,
            url = %url,
            html_bytes = extracted.html.len(),
            screenshot = extracted.screenshot.is_some(),
            modal = extracted.metadata.modal_triggered,
            shadow_dom = extracted.metadata.has_shadow_dom,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Page acquired"
        );
        Ok(ScrapedPage {
            url: url.to_string(),
            html: extracted.html,
            title: extracted.title,
            screenshot: extracted.screenshot,
            metadata: extracted.metadata,
            session: LiveSession::new(Arc::clone(&self.pool), parts, dom, request_id),
        })
    }

    async fn run(&self, url: &str, request_id: &str, parts: &mut SessionParts<L>) -> Result<Extracted> {
        let pooled = parts.context.insert(self.pool.acquire_context(request_id).await?);
        let opened = pooled
            .browser()
            .open_page(pooled.context())
            .await
            .map_err(|e| AuthDetectError::Browser(format!("Failed to open page: {e:#}")))?;
        let page: &PageOf<L> = parts.page.insert(opened);

        page.navigate(url, self.config.navigation_timeout()).await?;
        debug!(request_id = %request_id, "DOM content loaded");

        let timings = ReadinessTimings {
            network_idle_timeout: self.config.network_idle_timeout(),
            quiet_window: self.config.network_quiet_window(),
            settle_after_idle: self.config.settle_after_idle(),
            settle_after_busy: self.config.settle_after_busy(),
        };
        let network_idle = page.wait_until_ready(timings, request_id).await;

        let dom = page.dom();
        let screenshot = async {
            if self.config.capture_screenshots() {
                page.screenshot(
                    i64::from(self.config.screenshot_quality()),
                    self.config.screenshot_timeout(),
                    request_id,
                )
                .await
            } else {
                None
            }
        };
        let (content, screenshot) = tokio::join!(self.extract_content(page, &dom, request_id), screenshot);
        let content = content?;

        let has_shadow_dom = content.shadow.hosts > 0;
        let html = merge_shadow_html(content.html, &content.shadow.html, SHADOW_DOM_MARKER);

        Ok(Extracted {
            html,
            title: content.title,
            screenshot,
            metadata: ScrapeMetadata {
                has_shadow_dom,
                modal_triggered: content.modal_triggered,
                network_idle,
                has_auth_accessibility_signals: !content.signals.is_empty(),
                accessibility_signals: content.signals,
            },
        })
    }

    async fn extract_content(
        &self,
        page: &PageOf<L>,
        dom: &<PageOf<L> as RenderedPage>::Dom,
        request_id: &str,
    ) -> Result<Content> {
        let (modal_triggered, html, shadow, signals, title) = tokio::join!(
            reveal_modal(dom, ModalTimings::from(self.config.as_ref()), request_id),
            page.html(),
            page.shadow_content(),
            page.accessibility_signals(),
            page.title(),
        );

        let mut html = html?;
        if modal_triggered {
            // Pick up markup the modal inserted after the first serialization
            match page.html().await {
                Ok(revealed) => html = revealed,
                Err(e) => warn!(request_id = %request_id, "Failed to re-read DOM after modal: {e:#}"),
            }
        }

        let shadow = shadow.unwrap_or_else(|e| {
            debug!(request_id = %request_id, "Shadow DOM extraction failed: {e:#}");
            ShadowContent::default()
        });
        let signals = signals.unwrap_or_else(|e| {
            debug!(request_id = %request_id, "Accessibility scan failed: {e:#}");
            Vec::new()
        });
        let title = title.unwrap_or_else(|e| {
            debug!(request_id = %request_id, "Title read failed: {e:#}");
            None
        });

        Ok(Content {
            html,
            title,
            shadow,
            modal_triggered,
            signals,
        })
    }
}
