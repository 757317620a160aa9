//! Chrome/Chromium discovery and launch
//!
//! Lookup order is an explicit path, then `CHROMIUM_PATH`, then platform
//! install locations, then `which`. A managed Chromium is downloaded only
//! when all of those miss. The launched browser gets a CDP handler task
//! whose exit marks it disconnected.

use anyhow::{Context, Result, anyhow};
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use futures::StreamExt;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::{self, JoinHandle};
use tracing::{debug, error, info, trace, warn};

/// CDP request timeout for every launched browser
const CDP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Flags that keep a detection browser quiet and harder to fingerprint
const CHROME_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-infobars",
    "--disable-notifications",
    "--disable-print-preview",
    "--disable-software-rasterizer",
    "--disable-setuid-sandbox",
    "--no-first-run",
    "--no-default-browser-check",
    "--no-sandbox",
    "--ignore-certificate-errors",
    "--disable-extensions",
    "--disable-background-networking",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-breakpad",
    "--disable-component-extensions-with-background-pages",
    "--disable-features=TranslateUI",
    "--disable-hang-monitor",
    "--disable-ipc-flooding-protection",
    "--disable-prompt-on-repost",
    "--metrics-recording-only",
    "--password-store=basic",
    "--use-mock-keychain",
    "--hide-scrollbars",
    "--mute-audio",
];

/// Where an executable was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BrowserSource {
    Configured,
    Environment,
    InstallLocation,
    PathLookup,
}

impl fmt::Display for BrowserSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BrowserSource::Configured => "configuration",
            BrowserSource::Environment => "CHROMIUM_PATH",
            BrowserSource::InstallLocation => "install location",
            BrowserSource::PathLookup => "which",
        })
    }
}

/// Find a local Chrome/Chromium executable
///
/// An explicit path wins over `CHROMIUM_PATH`. A candidate that does not
/// exist is logged and skipped.
pub async fn find_browser_executable(explicit: Option<&Path>) -> Result<PathBuf> {
    let configured = explicit
        .map(|p| (BrowserSource::Configured, p.to_path_buf()))
        .into_iter();
    let environment = std::env::var_os("CHROMIUM_PATH")
        .map(|p| (BrowserSource::Environment, PathBuf::from(p)))
        .into_iter();

    for (source, path) in configured.chain(environment) {
        if path.exists() {
            info!(%source, path = %path.display(), "Using browser executable");
            return Ok(path);
        }
        warn!(%source, path = %path.display(), "Browser executable does not exist");
    }

    let found = install_locations()
        .into_iter()
        .find(|p| p.exists())
        .map(|p| (BrowserSource::InstallLocation, p))
        .or_else(|| which_browser().map(|p| (BrowserSource::PathLookup, p)));

    match found {
        Some((source, path)) => {
            info!(%source, path = %path.display(), "Found browser executable");
            Ok(path)
        }
        None => Err(anyhow!("Chrome/Chromium executable not found")),
    }
}

/// Platform install locations with `~` and `%VAR%` expanded
fn install_locations() -> Vec<PathBuf> {
    let raw: &[&str] = if cfg!(target_os = "windows") {
        &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"%LOCALAPPDATA%\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\Chromium\Application\chrome.exe",
        ]
    } else if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "~/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "~/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/opt/homebrew/bin/chromium",
        ]
    } else {
        &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/usr/local/bin/chromium",
            "/opt/google/chrome/chrome",
        ]
    };

    raw.iter()
        .filter_map(|entry| match entry.strip_prefix("~/") {
            Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
            None if entry.contains('%') => Some(PathBuf::from(expand_windows_env_vars(entry))),
            None => Some(PathBuf::from(entry)),
        })
        .collect()
}

fn which_browser() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        return None;
    }
    ["chromium", "chromium-browser", "google-chrome", "chrome"]
        .iter()
        .find_map(|cmd| {
            let output = Command::new("which").arg(cmd).output().ok()?;
            let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
            (output.status.success() && !found.is_empty()).then(|| PathBuf::from(found))
        })
}

/// Expand `%VAR%` tokens; unknown variables are kept verbatim and `%%` is a literal `%`
fn expand_windows_env_vars(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut rest = path;

    while let Some(open) = rest.find('%') {
        result.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('%') else {
            result.push('%');
            rest = after;
            break;
        };
        let name = &after[..close];
        match (name.is_empty(), std::env::var(name)) {
            (true, _) => result.push('%'),
            (false, Ok(value)) => result.push_str(&value),
            (false, Err(_)) => {
                result.push('%');
                result.push_str(name);
                result.push('%');
            }
        }
        rest = &after[close + 1..];
    }

    result.push_str(rest);
    result
}

/// Download a managed Chromium into the user cache directory
pub async fn download_managed_browser() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .map(|dir| dir.join("kodegen-authdetect"))
        .unwrap_or_else(|| std::env::temp_dir().join("kodegen_authdetect_chrome_cache"))
        .join("chromium");
    info!(dir = %cache_dir.display(), "Downloading managed Chromium");

    std::fs::create_dir_all(&cache_dir).context("Failed to create browser cache directory")?;

    let options = BrowserFetcherOptions::builder()
        .with_path(&cache_dir)
        .build()
        .context("Failed to build fetcher options")?;
    let revision = BrowserFetcher::new(options)
        .fetch()
        .await
        .context("Failed to fetch browser")?;

    info!(folder = %revision.folder_path.display(), "Downloaded Chromium");
    Ok(revision.executable_path)
}

/// Launch parameters for one browser process
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub executable: Option<PathBuf>,
    pub user_agent: String,
    pub window: (u32, u32),
    pub user_data_dir: PathBuf,
}

/// A launched browser with its CDP handler task
pub struct LaunchedChrome {
    pub browser: Browser,
    pub handler: JoinHandle<()>,
    pub user_data_dir: PathBuf,
    /// Cleared when the CDP connection ends
    pub connected: Arc<AtomicBool>,
}

/// Find or download Chrome/Chromium and launch it
///
/// Each launch gets its own user data directory so successive browsers
/// never contend for a profile lock.
pub async fn launch_browser(options: &LaunchOptions) -> Result<LaunchedChrome> {
    let chrome_path = match find_browser_executable(options.executable.as_deref()).await {
        Ok(path) => path,
        Err(e) => {
            warn!("{e}; falling back to a managed download");
            download_managed_browser().await?
        }
    };

    std::fs::create_dir_all(&options.user_data_dir)
        .context("Failed to create user data directory")?;

    let (width, height) = options.window;
    let mut builder = BrowserConfigBuilder::default()
        .request_timeout(CDP_REQUEST_TIMEOUT)
        .window_size(width, height)
        .user_data_dir(options.user_data_dir.clone())
        .chrome_executable(chrome_path)
        .arg(format!("--user-agent={}", options.user_agent));

    builder = if options.headless {
        builder.headless_mode(HeadlessMode::default())
    } else {
        builder.with_head()
    };
    for flag in CHROME_ARGS {
        builder = builder.arg(*flag);
    }

    let browser_config = builder
        .build()
        .map_err(|e| anyhow!("Failed to build browser config: {e}"))?;

    info!(
        user_data_dir = %options.user_data_dir.display(),
        headless = options.headless,
        "Launching browser"
    );
    let (browser, mut handler) = Browser::launch(browser_config)
        .await
        .context("Failed to launch browser")?;

    let connected = Arc::new(AtomicBool::new(true));
    let handler_connected = Arc::clone(&connected);
    let handler_task = task::spawn(async move {
        while let Some(event) = handler.next().await {
            let Err(e) = event else { continue };
            let message = e.to_string();
            // chromiumoxide cannot deserialize some CDP events Chrome emits
            if message.contains("data did not match any variant of untagged enum Message")
                || message.contains("Failed to deserialize WS response")
            {
                trace!("Suppressed CDP deserialization error: {message}");
            } else {
                error!("Browser handler error: {e:?}");
            }
        }
        handler_connected.store(false, Ordering::Release);
        debug!("Browser handler task completed");
    });

    Ok(LaunchedChrome {
        browser,
        handler: handler_task,
        user_data_dir: options.user_data_dir.clone(),
        connected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_variables_are_kept() {
        assert_eq!(
            expand_windows_env_vars(r"%AUTHDETECT_SURELY_UNSET%\chrome.exe"),
            r"%AUTHDETECT_SURELY_UNSET%\chrome.exe"
        );
    }

    #[test]
    fn double_percent_and_dangling_percent() {
        assert_eq!(expand_windows_env_vars("a%%b"), "a%b");
        assert_eq!(expand_windows_env_vars("a%b"), "a%b");
    }

    #[tokio::test]
    async fn missing_explicit_path_is_skipped() {
        let bogus = Path::new("/definitely/not/a/chrome");
        if let Ok(found) = find_browser_executable(Some(bogus)).await {
            assert_ne!(found, bogus);
        }
    }
}
