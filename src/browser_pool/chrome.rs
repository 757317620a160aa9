//! Chromium implementation of the pool's launcher seam

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::browser::{
    BrowserContextId, CloseParams, GetVersionParams,
};
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetTimezoneOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::fetch::{
    EnableParams, EventRequestPaused, FailRequestParams, RequestPattern,
};
use chromiumoxide::cdp::browser_protocol::network::{
    ErrorReason, ResourceType, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use futures::StreamExt;
use futures::future::{BoxFuture, FutureExt};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{BrowserLauncher, ManagedBrowser};
use crate::browser_profile::{POOL_PROFILE_PREFIX, create_unique_profile_with_prefix, remove_profile_dir};
use crate::browser_setup::{LaunchOptions, launch_browser};
use crate::config::AuthDetectConfig;
use crate::utils::with_timeout;

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);
const CLOSE_WAIT: Duration = Duration::from_secs(3);

/// Per-page emulation applied to every page opened in a context
#[derive(Debug, Clone)]
pub struct PageSettings {
    pub user_agent: String,
    pub viewport: (u32, u32),
    pub timezone: String,
    pub block_heavy_resources: bool,
}

impl From<&AuthDetectConfig> for PageSettings {
    fn from(config: &AuthDetectConfig) -> Self {
        Self {
            user_agent: config.user_agent().to_string(),
            viewport: config.viewport(),
            timezone: config.timezone().to_string(),
            block_heavy_resources: true,
        }
    }
}

/// Launches headless Chromium with a throwaway profile per process
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    headless: bool,
    executable: Option<PathBuf>,
    settings: PageSettings,
}

impl ChromeLauncher {
    pub fn from_config(config: &AuthDetectConfig) -> Self {
        Self {
            headless: config.headless(),
            executable: config.chrome_executable().map(PathBuf::from),
            settings: PageSettings::from(config),
        }
    }
}

impl BrowserLauncher for ChromeLauncher {
    type Browser = ChromeBrowser;

    fn launch(&self) -> BoxFuture<'static, Result<ChromeBrowser>> {
        let launcher = self.clone();
        async move {
            let profile = create_unique_profile_with_prefix(POOL_PROFILE_PREFIX)?;
            let options = LaunchOptions {
                headless: launcher.headless,
                executable: launcher.executable.clone(),
                user_agent: launcher.settings.user_agent.clone(),
                window: launcher.settings.viewport,
                user_data_dir: profile.path().to_path_buf(),
            };

            let launched = launch_browser(&options).await?;
            // ChromeBrowser owns profile cleanup from here on
            let chrome = ChromeBrowser {
                browser: launched.browser,
                handler: launched.handler,
                connected: launched.connected,
                profile_dir: profile.into_path(),
                settings: launcher.settings,
            };

            let version = with_timeout(
                async {
                    chrome
                        .browser
                        .execute(GetVersionParams::default())
                        .await
                        .context("Browser health check failed")
                },
                HEALTH_CHECK_TIMEOUT,
                "Browser health check",
            )
            .await?;
            info!(product = %version.result.product, "Browser launched");

            Ok(chrome)
        }
        .boxed()
    }
}

/// A running Chromium process
pub struct ChromeBrowser {
    browser: Browser,
    handler: JoinHandle<()>,
    connected: Arc<AtomicBool>,
    profile_dir: PathBuf,
    settings: PageSettings,
}

/// Incognito-style browser context owned by a single request
#[derive(Debug, Clone)]
pub struct IsolatedContext {
    id: BrowserContextId,
    request_id: String,
}

impl IsolatedContext {
    pub fn id(&self) -> &BrowserContextId {
        &self.id
    }
}

/// A configured page plus its resource-blocking interceptor
pub struct ContextPage {
    pub page: Page,
    interceptor: Option<JoinHandle<()>>,
}

impl ContextPage {
    /// Stop interception and close the target
    pub async fn close_page(&mut self) -> Result<()> {
        if let Some(interceptor) = self.interceptor.take() {
            interceptor.abort();
        }
        self.page.clone().close().await.context("Failed to close page")
    }
}

impl Drop for ContextPage {
    fn drop(&mut self) {
        if let Some(interceptor) = self.interceptor.take() {
            interceptor.abort();
        }
    }
}

impl ChromeBrowser {
    /// Open `about:blank` inside the context with emulation applied
    pub async fn open_context_page(&self, context: &IsolatedContext) -> Result<ContextPage> {
        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context.id.clone())
            .build()
            .map_err(anyhow::Error::msg)?;
        let page = self
            .browser
            .new_page(target)
            .await
            .context("Failed to open page")?;

        let interceptor = match configure_page(&page, &self.settings).await {
            Ok(interceptor) => interceptor,
            Err(e) => {
                let _ = page.close().await;
                return Err(e);
            }
        };

        debug!(request_id = %context.request_id, "Page opened");
        Ok(ContextPage { page, interceptor })
    }
}

async fn configure_page(page: &Page, settings: &PageSettings) -> Result<Option<JoinHandle<()>>> {
    page.execute(SetUserAgentOverrideParams::new(settings.user_agent.clone()))
        .await
        .context("Failed to set user agent")?;

    let (width, height) = settings.viewport;
    page.execute(
        SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(width))
            .height(i64::from(height))
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(anyhow::Error::msg)?,
    )
    .await
    .context("Failed to set viewport")?;

    page.execute(SetTimezoneOverrideParams::new(settings.timezone.clone()))
        .await
        .context("Failed to set timezone")?;

    if !settings.block_heavy_resources {
        return Ok(None);
    }

    // Listener first so no paused request is missed
    let mut paused = page.event_listener::<EventRequestPaused>().await?;
    let patterns = [ResourceType::Image, ResourceType::Font, ResourceType::Media]
        .into_iter()
        .map(|kind| RequestPattern::builder().resource_type(kind).build())
        .collect::<Vec<_>>();
    page.execute(EnableParams::builder().patterns(patterns).build())
        .await
        .context("Failed to enable request interception")?;

    let intercept_page = page.clone();
    let interceptor = tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            let fail = FailRequestParams::new(event.request_id.clone(), ErrorReason::BlockedByClient);
            if intercept_page.execute(fail).await.is_err() {
                break;
            }
        }
    });

    Ok(Some(interceptor))
}

#[async_trait]
impl ManagedBrowser for ChromeBrowser {
    type Context = IsolatedContext;

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire) && !self.handler.is_finished()
    }

    async fn create_context(&self, request_id: &str) -> Result<IsolatedContext> {
        let created = self
            .browser
            .execute(CreateBrowserContextParams::default())
            .await
            .context("CDP createBrowserContext failed")?;
        Ok(IsolatedContext {
            id: created.result.browser_context_id,
            request_id: request_id.to_string(),
        })
    }

    async fn dispose_context(&self, context: IsolatedContext) -> Result<()> {
        self.browser
            .execute(DisposeBrowserContextParams::new(context.id))
            .await
            .context("CDP disposeBrowserContext failed")?;
        Ok(())
    }

    async fn close(&self) {
        if self.is_connected()
            && let Err(e) = self.browser.execute(CloseParams::default()).await
        {
            debug!(error = %e, "Browser close command failed");
        }

        let deadline = tokio::time::Instant::now() + CLOSE_WAIT;
        while self.connected.load(Ordering::Acquire) && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        if self.connected.load(Ordering::Acquire) {
            warn!("Browser did not exit within {}s", CLOSE_WAIT.as_secs());
        }

        self.handler.abort();
        remove_profile_dir(&self.profile_dir);
    }
}

impl Drop for ChromeBrowser {
    fn drop(&mut self) {
        self.handler.abort();
        remove_profile_dir(&self.profile_dir);
    }
}
