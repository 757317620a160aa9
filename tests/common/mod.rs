//! Shared fixtures: fake browser launcher, scripted vision model, sample pages

#![allow(dead_code)]

use anyhow::bail;
use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use kodegen_tools_authdetect::acquisition::{PageHost, RenderedPage};
use kodegen_tools_authdetect::browser_pool::{BrowserLauncher, BrowserPool, BrowserPoolConfig, ManagedBrowser};
use kodegen_tools_authdetect::config::AuthDetectConfig;
use kodegen_tools_authdetect::detector::VisionModel;
use kodegen_tools_authdetect::dom::{DomProbe, Locator, StaticDom};
use kodegen_tools_authdetect::page_extractor::{ReadinessTimings, ShadowContent};
use kodegen_tools_authdetect::error::{AuthDetectError, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Config with timeouts short enough for tests
pub fn test_config() -> AuthDetectConfig {
    AuthDetectConfig::builder()
        .ai_timeout(Duration::from_millis(300))
        .snippet_batch_timeout(Duration::from_secs(2))
        .locator_wait(Duration::from_millis(50))
        .oauth_fallback(Duration::from_millis(50), Duration::from_millis(500))
        .pattern_lookup_timeout(Duration::from_millis(100))
        .build()
        .unwrap()
}

// =============================================================================
// Fake browser
// =============================================================================

#[derive(Default)]
pub struct FakeBrowserState {
    pub connected: AtomicBool,
    pub closed: AtomicBool,
    pub contexts_created: AtomicUsize,
    pub contexts_disposed: AtomicUsize,
    pub fail_dispose: AtomicBool,
    pub pages_opened: AtomicUsize,
    pub pages_closed: AtomicUsize,
}

/// How pages from a fake browser respond to navigation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Navigation {
    #[default]
    Load,
    Fail,
    Hang,
}

pub struct FakeBrowser {
    pub state: Arc<FakeBrowserState>,
    pub navigation: Navigation,
}

#[async_trait]
impl ManagedBrowser for FakeBrowser {
    type Context = usize;

    fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }

    async fn create_context(&self, _request_id: &str) -> anyhow::Result<usize> {
        Ok(self.state.contexts_created.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn dispose_context(&self, _context: usize) -> anyhow::Result<()> {
        if self.state.fail_dispose.load(Ordering::SeqCst) {
            bail!("context already gone");
        }
        self.state.contexts_disposed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) {
        self.state.connected.store(false, Ordering::SeqCst);
        self.state.closed.store(true, Ordering::SeqCst);
    }
}

/// A page serving `LOGIN_PAGE` that counts its own close
pub struct FakePage {
    state: Arc<FakeBrowserState>,
    navigation: Navigation,
    closed: bool,
}

#[async_trait]
impl PageHost for FakeBrowser {
    type Page = FakePage;

    async fn open_page(&self, _context: &usize) -> anyhow::Result<FakePage> {
        self.state.pages_opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakePage {
            state: Arc::clone(&self.state),
            navigation: self.navigation,
            closed: false,
        })
    }
}

#[async_trait]
impl RenderedPage for FakePage {
    type Dom = StaticDom;

    async fn navigate(&self, url: &str, _timeout: Duration) -> Result<()> {
        match self.navigation {
            Navigation::Load => Ok(()),
            Navigation::Fail => Err(AuthDetectError::Navigation {
                url: url.to_string(),
                message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            }),
            Navigation::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }
    }

    async fn wait_until_ready(&self, _timings: ReadinessTimings, _request_id: &str) -> bool {
        true
    }

    fn dom(&self) -> StaticDom {
        StaticDom::new(LOGIN_PAGE)
    }

    async fn html(&self) -> anyhow::Result<String> {
        Ok(LOGIN_PAGE.to_string())
    }

    async fn shadow_content(&self) -> anyhow::Result<ShadowContent> {
        Ok(ShadowContent::default())
    }

    async fn accessibility_signals(&self) -> anyhow::Result<Vec<String>> {
        Ok(vec!["password-field".to_string()])
    }

    async fn title(&self) -> anyhow::Result<Option<String>> {
        Ok(Some("Sign in - Example".to_string()))
    }

    async fn screenshot(&self, _quality: i64, _timeout: Duration, _request_id: &str) -> Option<Vec<u8>> {
        Some(vec![0xFF, 0xD8, 0xFF])
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        if !self.closed {
            self.closed = true;
            self.state.pages_closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Counts launches and records every browser it hands out
#[derive(Clone, Default)]
pub struct FakeLauncher {
    pub launches: Arc<AtomicUsize>,
    pub fail_next: Arc<AtomicBool>,
    pub delay: Duration,
    pub navigation: Navigation,
    pub browsers: Arc<Mutex<Vec<Arc<FakeBrowserState>>>>,
}

impl FakeLauncher {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn with_navigation(navigation: Navigation) -> Self {
        Self {
            navigation,
            ..Self::default()
        }
    }

    pub fn launched(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn browser(&self, index: usize) -> Arc<FakeBrowserState> {
        Arc::clone(&self.browsers.lock()[index])
    }
}

impl BrowserLauncher for FakeLauncher {
    type Browser = FakeBrowser;

    fn launch(&self) -> BoxFuture<'static, anyhow::Result<FakeBrowser>> {
        let launcher = self.clone();
        async move {
            launcher.launches.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(launcher.delay).await;
            if launcher.fail_next.swap(false, Ordering::SeqCst) {
                bail!("chrome exited during startup");
            }
            let state = Arc::new(FakeBrowserState::default());
            state.connected.store(true, Ordering::SeqCst);
            launcher.browsers.lock().push(Arc::clone(&state));
            Ok(FakeBrowser {
                state,
                navigation: launcher.navigation,
            })
        }
        .boxed()
    }
}

pub fn fake_pool(launcher: FakeLauncher, idle_timeout: Duration) -> Arc<BrowserPool<FakeLauncher>> {
    Arc::new(BrowserPool::new(
        launcher,
        BrowserPoolConfig {
            idle_timeout,
            check_interval: Duration::from_millis(20),
        },
    ))
}

// =============================================================================
// Scripted model
// =============================================================================

pub enum ModelScript {
    Reply(String),
    Fail(String),
    Hang,
    Panic,
}

pub struct ScriptedModel {
    script: ModelScript,
    pub calls: AtomicUsize,
    pub saw_image: AtomicBool,
}

impl ScriptedModel {
    pub fn new(script: ModelScript) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
            saw_image: AtomicBool::new(false),
        })
    }

    pub fn reply(text: &str) -> Arc<Self> {
        Self::new(ModelScript::Reply(text.to_string()))
    }
}

#[async_trait]
impl VisionModel for ScriptedModel {
    async fn generate(&self, _prompt: &str, image: Option<&[u8]>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.saw_image.store(image.is_some(), Ordering::SeqCst);
        match &self.script {
            ModelScript::Reply(text) => Ok(text.clone()),
            ModelScript::Fail(message) => Err(AuthDetectError::AiRequest(message.clone())),
            ModelScript::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(String::new())
            }
            ModelScript::Panic => panic!("model client bug"),
        }
    }
}

// =============================================================================
// Stalled page
// =============================================================================

/// A page whose every query hangs, like a renderer stuck on a script
#[derive(Default)]
pub struct StalledDom {
    pub queries: AtomicUsize,
}

impl StalledDom {
    async fn stall(&self) {
        self.queries.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(3600)).await;
    }
}

#[async_trait]
impl DomProbe for StalledDom {
    async fn outer_html(&self, _locator: &Locator) -> anyhow::Result<Option<String>> {
        self.stall().await;
        Ok(None)
    }

    async fn click(&self, _locator: &Locator) -> anyhow::Result<bool> {
        self.stall().await;
        Ok(false)
    }

    async fn any_visible(&self, _selectors: &[&str]) -> anyhow::Result<bool> {
        self.stall().await;
        Ok(false)
    }
}

// =============================================================================
// Pages
// =============================================================================

pub const LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Sign in - Example</title></head>
<body>
  <header><a href="/">Home</a></header>
  <main>
    <form id="login" action="/session" method="post">
      <label>Email <input type="email" name="email" autocomplete="username"></label>
      <label>Password <input type="password" name="password" autocomplete="current-password"></label>
      <button type="submit">Sign in</button>
    </form>
    <div class="social-login">
      <button class="btn-google">Continue with Google</button>
      <button class="btn-github">Continue with GitHub</button>
    </div>
  </main>
</body>
</html>"#;

pub const MARKETING_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Widgets</title></head>
<body>
  <h1>The best widgets</h1>
  <p>Buy our widgets today.</p>
  <button>Add to cart</button>
</body>
</html>"#;

pub const PASSKEY_PAGE: &str = r#"<!DOCTYPE html>
<html>
<body>
  <div class="auth">
    <input type="email" name="email" autocomplete="username webauthn">
    <button id="passkey">Sign in with a passkey</button>
  </div>
</body>
</html>"#;
