//! Chrome profile directories
//!
//! Every launched browser gets a fresh UUID-named user data directory so
//! successive launches never hit a stale `SingletonLock`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Profile directory prefix for browsers owned by the pool
pub const POOL_PROFILE_PREFIX: &str = "authdetect_chrome";

/// RAII wrapper for a Chrome profile directory
///
/// Removes the directory on drop unless `into_path()` hands ownership to
/// another cleanup mechanism.
#[derive(Debug)]
pub struct BrowserProfile {
    path: PathBuf,
    cleanup_on_drop: bool,
}

impl BrowserProfile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Consume the profile and return the path, disabling auto-cleanup
    pub fn into_path(mut self) -> PathBuf {
        self.cleanup_on_drop = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for BrowserProfile {
    fn drop(&mut self) {
        if self.cleanup_on_drop {
            remove_profile_dir(&self.path);
        }
    }
}

/// Create a unique profile directory under the system temp dir
pub fn create_unique_profile_with_prefix(prefix: &str) -> Result<BrowserProfile> {
    let path = std::env::temp_dir().join(format!("{prefix}_{}", Uuid::new_v4()));

    debug!("Creating unique Chrome profile: {}", path.display());

    // create_dir fails if the directory exists, guarding against collisions
    std::fs::create_dir(&path)
        .with_context(|| format!("Failed to create profile directory: {}", path.display()))?;

    Ok(BrowserProfile {
        path,
        cleanup_on_drop: true,
    })
}

/// Best-effort removal of a profile directory
pub fn remove_profile_dir(path: &Path) {
    if !path.exists() {
        return;
    }
    info!("Removing Chrome profile directory: {}", path.display());
    if let Err(e) = std::fs::remove_dir_all(path) {
        warn!("Failed to remove profile directory {}: {}", path.display(), e);
    }
}
