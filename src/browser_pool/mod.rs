//! Single shared browser with lazy launch and idle retirement
//!
//! The pool owns at most one browser process. It is launched on first use,
//! shared by every request, and closed after sitting idle. Concurrent
//! acquirers during a launch all await the same in-flight launch future.
//! Each request works in its own isolated context issued by the pool.

pub mod chrome;

use anyhow::anyhow;
use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::AuthDetectConfig;
use crate::error::{AuthDetectError, Result};

pub use chrome::{ChromeBrowser, ChromeLauncher, IsolatedContext};

// =============================================================================
// Launcher seam
// =============================================================================

/// Starts browser processes for the pool
pub trait BrowserLauncher: Send + Sync + 'static {
    type Browser: ManagedBrowser;

    /// Launch a browser; the returned future must not borrow the launcher
    fn launch(&self) -> BoxFuture<'static, anyhow::Result<Self::Browser>>;
}

/// A running browser the pool can hand out contexts from
#[async_trait]
pub trait ManagedBrowser: Send + Sync + 'static {
    type Context: Send + Sync + 'static;

    fn is_connected(&self) -> bool;

    /// Create a context isolated from every other context (cookies, storage, cache)
    async fn create_context(&self, request_id: &str) -> anyhow::Result<Self::Context>;

    async fn dispose_context(&self, context: Self::Context) -> anyhow::Result<()>;

    /// Terminate the browser process; never fails
    async fn close(&self);
}

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct BrowserPoolConfig {
    /// Close the browser after this long without use (default: 5 minutes)
    pub idle_timeout: Duration,
    /// How often the idle reaper checks (default: 60s)
    pub check_interval: Duration,
}

impl Default for BrowserPoolConfig {
    fn default() -> Self {
        Self::from(&AuthDetectConfig::default())
    }
}

impl From<&AuthDetectConfig> for BrowserPoolConfig {
    fn from(config: &AuthDetectConfig) -> Self {
        Self {
            idle_timeout: config.browser_idle_timeout(),
            check_interval: config.idle_check_interval(),
        }
    }
}

// =============================================================================
// Pooled context
// =============================================================================

/// Decrements the active-context count when dropped
struct ActiveGuard(Arc<AtomicUsize>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A context handed out by the pool, holding its browser alive
pub struct PooledContext<B: ManagedBrowser> {
    context: B::Context,
    browser: Arc<B>,
    request_id: String,
    _active: ActiveGuard,
}

impl<B: ManagedBrowser> PooledContext<B> {
    pub fn context(&self) -> &B::Context {
        &self.context
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

// =============================================================================
// Health
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolHealth {
    /// A browser exists and is connected
    pub healthy: bool,
    /// Time since the last acquisition or release, while a browser exists
    pub idle_time_ms: Option<u64>,
    pub initializing: bool,
    pub active_contexts: usize,
    pub launches: u64,
}

// =============================================================================
// Pool
// =============================================================================

type LaunchResult<B> = std::result::Result<Arc<B>, Arc<anyhow::Error>>;
type SharedLaunch<B> = Shared<BoxFuture<'static, LaunchResult<B>>>;

struct PoolState<B> {
    browser: Option<Arc<B>>,
    /// In-flight launch, tagged with a generation so a stale completion never
    /// overwrites newer state
    launching: Option<(u64, SharedLaunch<B>)>,
    last_used: Instant,
}

pub struct BrowserPool<L: BrowserLauncher> {
    launcher: L,
    config: BrowserPoolConfig,
    state: Mutex<PoolState<L::Browser>>,
    generation: AtomicU64,
    launches: AtomicU64,
    active_contexts: Arc<AtomicUsize>,
    shutdown: CancellationToken,
}

impl<L: BrowserLauncher> BrowserPool<L> {
    pub fn new(launcher: L, config: BrowserPoolConfig) -> Self {
        Self {
            launcher,
            config,
            state: Mutex::new(PoolState {
                browser: None,
                launching: None,
                last_used: Instant::now(),
            }),
            generation: AtomicU64::new(0),
            launches: AtomicU64::new(0),
            active_contexts: Arc::new(AtomicUsize::new(0)),
            shutdown: CancellationToken::new(),
        }
    }

    /// Number of browser launches started over the pool's lifetime
    pub fn launch_count(&self) -> u64 {
        self.launches.load(Ordering::Acquire)
    }

    pub fn active_contexts(&self) -> usize {
        self.active_contexts.load(Ordering::Acquire)
    }

    fn touch(&self) {
        self.state.lock().last_used = Instant::now();
    }

    /// Ready browser, launching or relaunching as needed
    async fn browser(&self, request_id: &str) -> Result<Arc<L::Browser>> {
        if self.shutdown.is_cancelled() {
            return Err(AuthDetectError::BrowserLaunch("browser pool is shut down".into()));
        }

        let (generation, launch) = {
            let mut state = self.state.lock();

            if let Some(browser) = state.browser.clone() {
                if browser.is_connected() {
                    state.last_used = Instant::now();
                    return Ok(browser);
                }
                warn!(request_id = %request_id, "Browser disconnected, relaunching");
                if let Some(stale) = state.browser.take() {
                    tokio::spawn(async move { stale.close().await });
                }
            }

            match &state.launching {
                Some((generation, launch)) => {
                    debug!(request_id = %request_id, "Joining in-flight browser launch");
                    (*generation, launch.clone())
                }
                None => {
                    let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
                    self.launches.fetch_add(1, Ordering::AcqRel);
                    info!(request_id = %request_id, generation, "Launching browser");

                    let task = tokio::spawn(self.launcher.launch());
                    let launch = async move {
                        match task.await {
                            Ok(Ok(browser)) => Ok(Arc::new(browser)),
                            Ok(Err(e)) => Err(Arc::new(e)),
                            Err(join) => Err(Arc::new(anyhow!("browser launch task failed: {join}"))),
                        }
                    }
                    .boxed()
                    .shared();
                    state.launching = Some((generation, launch.clone()));
                    (generation, launch)
                }
            }
        };

        let outcome = launch.await;

        {
            let mut state = self.state.lock();
            let current = matches!(&state.launching, Some((g, _)) if *g == generation);
            if current {
                state.launching = None;
                if let Ok(browser) = &outcome
                    && !self.shutdown.is_cancelled()
                {
                    state.browser = Some(Arc::clone(browser));
                }
            }
            state.last_used = Instant::now();
        }

        match outcome {
            Ok(_) if self.shutdown.is_cancelled() => Err(AuthDetectError::BrowserLaunch(
                "browser pool shut down during launch".into(),
            )),
            Ok(browser) => Ok(browser),
            Err(e) => {
                warn!(request_id = %request_id, error = %e, "Browser launch failed");
                Err(AuthDetectError::BrowserLaunch(format!("{e:#}")))
            }
        }
    }

    /// Issue an isolated context, launching the browser on first use
    pub async fn acquire_context(&self, request_id: &str) -> Result<PooledContext<L::Browser>> {
        let browser = self.browser(request_id).await?;
        let context = browser
            .create_context(request_id)
            .await
            .map_err(|e| AuthDetectError::Browser(format!("Failed to create browser context: {e:#}")))?;

        self.active_contexts.fetch_add(1, Ordering::AcqRel);
        self.touch();
        debug!(request_id = %request_id, "Browser context acquired");

        Ok(PooledContext {
            context,
            browser,
            request_id: request_id.to_string(),
            _active: ActiveGuard(Arc::clone(&self.active_contexts)),
        })
    }

    /// Dispose a context; failures are logged and swallowed
    pub async fn release_context(&self, pooled: PooledContext<L::Browser>) {
        let PooledContext {
            context,
            browser,
            request_id,
            _active: active,
        } = pooled;

        if let Err(e) = browser.dispose_context(context).await {
            warn!(request_id = %request_id, error = %e, "Failed to dispose browser context");
        } else {
            debug!(request_id = %request_id, "Browser context released");
        }
        drop(active);
        self.touch();
    }

    pub fn health_check(&self) -> PoolHealth {
        let state = self.state.lock();
        let healthy = state.browser.as_ref().is_some_and(|b| b.is_connected());
        let idle_time_ms = state
            .browser
            .as_ref()
            .map(|_| u64::try_from(state.last_used.elapsed().as_millis()).unwrap_or(u64::MAX));
        let initializing = state.launching.is_some();
        drop(state);

        PoolHealth {
            healthy,
            idle_time_ms,
            initializing,
            active_contexts: self.active_contexts(),
            launches: self.launch_count(),
        }
    }

    /// Close the browser if it has sat idle past the timeout with no
    /// outstanding contexts; returns whether a browser was closed
    pub async fn retire_if_idle(&self) -> bool {
        let retired = {
            let mut state = self.state.lock();
            let idle = state.last_used.elapsed();
            let expired = idle >= self.config.idle_timeout && self.active_contexts() == 0;
            if expired { state.browser.take().map(|b| (b, idle)) } else { None }
        };

        match retired {
            Some((browser, idle)) => {
                info!(idle_secs = idle.as_secs(), "Closing idle browser");
                browser.close().await;
                true
            }
            None => false,
        }
    }

    /// Run the idle reaper until `shutdown()`
    pub fn start_idle_reaper(self: &Arc<Self>) -> JoinHandle<()> {
        let pool = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(pool.config.check_interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    () = pool.shutdown.cancelled() => {
                        debug!("Browser idle reaper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        pool.retire_if_idle().await;
                    }
                }
            }
        })
    }

    /// Stop background work and close the browser, including one mid-launch
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let (browser, launching) = {
            let mut state = self.state.lock();
            (state.browser.take(), state.launching.take())
        };

        if let Some((_, launch)) = launching
            && let Ok(launched) = launch.await
        {
            launched.close().await;
        }
        if let Some(browser) = browser {
            info!("Shutting down browser pool");
            browser.close().await;
        }
    }
}
