//! Page-level seam between the acquirer and a browser
//!
//! `PageHost` opens pages inside a pool context and `RenderedPage` is
//! everything acquisition does with one. The Chromium implementations live
//! here; tests supply their own.

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

use crate::browser_pool::chrome::ContextPage;
use crate::browser_pool::{BrowserLauncher, ChromeBrowser, IsolatedContext, ManagedBrowser};
use crate::dom::{ChromeDom, DomProbe};
use crate::page_extractor::{
    ReadinessTimings, ShadowContent, capture_screenshot, extract_accessibility_signals,
    extract_html, extract_shadow_dom, extract_title, navigate, wait_for_page_load,
};

/// A browser that can open pages inside its contexts
#[async_trait]
pub trait PageHost: ManagedBrowser {
    type Page: RenderedPage;

    async fn open_page(&self, context: &Self::Context) -> Result<Self::Page>;
}

/// An open page the acquirer navigates, reads and finally closes
#[async_trait]
pub trait RenderedPage: Send + Sync + 'static {
    type Dom: DomProbe + 'static;

    /// Navigate and wait for `domcontentloaded`
    async fn navigate(&self, url: &str, timeout: Duration) -> crate::Result<()>;

    /// Returns whether network idle was reached
    async fn wait_until_ready(&self, timings: ReadinessTimings, request_id: &str) -> bool;

    /// DOM queries against this page
    fn dom(&self) -> Self::Dom;

    async fn html(&self) -> Result<String>;

    async fn shadow_content(&self) -> Result<ShadowContent>;

    async fn accessibility_signals(&self) -> Result<Vec<String>>;

    async fn title(&self) -> Result<Option<String>>;

    /// JPEG bytes, or `None` when capture fails or times out
    async fn screenshot(&self, quality: i64, timeout: Duration, request_id: &str) -> Option<Vec<u8>>;

    async fn close(&mut self) -> Result<()>;
}

/// Page type a launcher's browsers open
pub type PageOf<L> = <<L as BrowserLauncher>::Browser as PageHost>::Page;

#[async_trait]
impl PageHost for ChromeBrowser {
    type Page = ContextPage;

    async fn open_page(&self, context: &IsolatedContext) -> Result<ContextPage> {
        self.open_context_page(context).await
    }
}

#[async_trait]
impl RenderedPage for ContextPage {
    type Dom = ChromeDom;

    async fn navigate(&self, url: &str, timeout: Duration) -> crate::Result<()> {
        navigate(&self.page, url, timeout).await
    }

    async fn wait_until_ready(&self, timings: ReadinessTimings, request_id: &str) -> bool {
        wait_for_page_load(&self.page, timings, request_id).await
    }

    fn dom(&self) -> ChromeDom {
        ChromeDom::new(self.page.clone())
    }

    async fn html(&self) -> Result<String> {
        extract_html(&self.page).await
    }

    async fn shadow_content(&self) -> Result<ShadowContent> {
        extract_shadow_dom(&self.page).await
    }

    async fn accessibility_signals(&self) -> Result<Vec<String>> {
        extract_accessibility_signals(&self.page).await
    }

    async fn title(&self) -> Result<Option<String>> {
        extract_title(&self.page).await
    }

    async fn screenshot(&self, quality: i64, timeout: Duration, request_id: &str) -> Option<Vec<u8>> {
        capture_screenshot(&self.page, quality, timeout, request_id).await
    }

    async fn close(&mut self) -> Result<()> {
        self.close_page().await
    }
}
