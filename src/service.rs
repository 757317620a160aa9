//! Detection pipeline: cache, acquisition, detection, release
//!
//! `AuthDetectService` is the request boundary. It owns the live session
//! returned by acquisition and releases it exactly once on every path.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::acquisition::{ChromePool, PageAcquirer, ScrapedPage};
use crate::browser_pool::{BrowserPool, BrowserPoolConfig, ChromeLauncher};
use crate::cache::{CachePolicy, ResultCache};
use crate::config::AuthDetectConfig;
use crate::detector::{DetectionResult, Detector};
use crate::error::{AuthDetectError, Result};
use crate::utils::{is_valid_url, new_request_id};

/// A detection result plus whether it came from the cache
#[derive(Debug, Clone, Serialize)]
pub struct DetectResponse {
    #[serde(flatten)]
    pub result: DetectionResult,
    pub cached: bool,
}

pub struct AuthDetectService {
    config: Arc<AuthDetectConfig>,
    pool: Arc<ChromePool>,
    acquirer: PageAcquirer,
    detector: Detector,
    cache: Arc<ResultCache>,
    shutdown: CancellationToken,
}

impl AuthDetectService {
    /// Build the service; the browser is not launched until first use
    pub fn new(config: AuthDetectConfig) -> Result<Self> {
        let detector = Detector::from_config(&config)?;
        Ok(Self::with_detector(config, detector))
    }

    pub fn with_detector(config: AuthDetectConfig, detector: Detector) -> Self {
        let config = Arc::new(config);
        let pool = Arc::new(BrowserPool::new(
            ChromeLauncher::from_config(&config),
            BrowserPoolConfig::from(config.as_ref()),
        ));
        let cache = Arc::new(ResultCache::new(CachePolicy::from_config(&config)));
        Self {
            acquirer: PageAcquirer::new(Arc::clone(&pool), Arc::clone(&config)),
            config,
            pool,
            detector,
            cache,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &AuthDetectConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    pub fn pool(&self) -> &Arc<ChromePool> {
        &self.pool
    }

    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    /// Spawn the idle-browser reaper and the cache purge task
    pub fn start_background_tasks(&self) -> Vec<JoinHandle<()>> {
        vec![
            self.pool.start_idle_reaper(),
            Arc::clone(&self.cache)
                .start_cleanup_task(self.config.cache_purge_interval(), self.shutdown.clone()),
        ]
    }

    /// Detect authentication on `url`
    ///
    /// Only an invalid URL is an `Err`; pipeline failures come back as an
    /// unsuccessful `DetectionResult`.
    pub async fn detect(&self, url: &str) -> Result<DetectResponse> {
        let url = url.trim();
        if !is_valid_url(url) {
            return Err(AuthDetectError::InvalidUrl(url.to_string()));
        }

        let request_id = new_request_id();
        let started = Instant::now();

        if let Some(result) = self.cache.get(url) {
            info!(request_id = %request_id, url = %url, "Serving cached detection");
            return Ok(DetectResponse { result, cached: true });
        }

        info!(request_id = %request_id, url = %url, "Starting detection");
        let result = match self.acquirer.acquire(url, &request_id).await {
            Ok(page) => self.detect_on_page(url, page, &request_id).await,
            Err(e) => DetectionResult::failure(url, e.to_string()),
        };

        self.cache.set(url, &result);
        info!(
            request_id = %request_id,
            url = %url,
            success = result.success,
            found = result.found,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Detection finished"
        );
        Ok(DetectResponse { result, cached: false })
    }

    async fn detect_on_page(&self, url: &str, page: ScrapedPage, request_id: &str) -> DetectionResult {
        let ScrapedPage {
            html,
            title,
            screenshot,
            metadata,
            session,
            ..
        } = page;

        if !metadata.accessibility_signals.is_empty() {
            info!(
                request_id = %request_id,
                signals = ?metadata.accessibility_signals,
                "Accessibility auth signals"
            );
        }

        let detection = AssertUnwindSafe(self.detector.detect(
            &html,
            url,
            screenshot.as_deref(),
            session.dom(),
            request_id,
        ))
        .catch_unwind()
        .await;

        session.release().await;

        match detection {
            Ok(result) => result.with_page_report(title, screenshot.map(|bytes| BASE64.encode(bytes))),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(request_id = %request_id, "Detection panicked: {message}");
                DetectionResult::failure(url, format!("Detection failed: {message}"))
            }
        }
    }

    /// Stop background tasks and close the browser
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.pool.shutdown().await;
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
