pub mod acquisition;
pub mod browser_pool;
pub mod browser_profile;
pub mod browser_setup;
pub mod cache;
pub mod config;
pub mod detector;
pub mod dom;
pub mod error;
pub mod page_extractor;
pub mod server;
pub mod service;
pub mod utils;

pub use acquisition::{
    ChromePool, LiveSession, PageAcquirer, PageHost, RenderedPage, ScrapeMetadata, ScrapedPage,
};
pub use browser_pool::{
    BrowserLauncher, BrowserPool, BrowserPoolConfig, ManagedBrowser, PoolHealth, PooledContext,
};
pub use browser_setup::{download_managed_browser, find_browser_executable, launch_browser};
pub use cache::{CachePolicy, CacheStats, ResultCache};
pub use config::{AuthDetectConfig, AuthDetectConfigBuilder};
pub use detector::{
    AuthComponent, ComponentDetails, ComponentType, DetectionMethod, DetectionResult, Detector,
    GeminiClient, VisionModel,
};
pub use dom::{DomProbe, Locator, StaticDom};
pub use error::{AuthDetectError, Result};
pub use service::{AuthDetectService, DetectResponse};
