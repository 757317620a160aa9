//! In-memory result cache with LRU eviction and per-host TTL policy
//!
//! Keys are normalized URLs (no `www.`, query, fragment or trailing slash),
//! so tracking parameters never fragment the cache. The store is a
//! `parking_lot::Mutex<LruCache>`; the lock is never held across an await.

use chrono::{DateTime, Utc};
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::AuthDetectConfig;
use crate::detector::types::{DetectionMethod, DetectionResult};
use crate::utils::{cache_host, normalize_cache_key};

/// Hybrid results carry only pattern components
fn is_pattern_derived(method: DetectionMethod) -> bool {
    matches!(method, DetectionMethod::Pattern | DetectionMethod::Hybrid)
}

/// Which results are stored and for how long
#[derive(Debug, Clone)]
pub struct CachePolicy {
    pub default_ttl: Duration,
    /// Shorter lifetime for pattern-derived results; `None` uses `default_ttl`
    pub pattern_ttl: Option<Duration>,
    /// Exact-host overrides, keyed without `www.`
    pub domain_ttls: HashMap<String, Duration>,
    pub cache_not_found: bool,
    pub cache_pattern_results: bool,
    pub max_entries: NonZeroUsize,
}

impl CachePolicy {
    #[must_use]
    pub fn from_config(config: &AuthDetectConfig) -> Self {
        Self {
            default_ttl: config.cache_ttl(),
            pattern_ttl: config.pattern_cache_ttl(),
            domain_ttls: config.domain_ttls(),
            cache_not_found: config.cache_not_found(),
            cache_pattern_results: config.cache_pattern_results(),
            max_entries: NonZeroUsize::new(config.max_cache_entries())
                .unwrap_or(NonZeroUsize::MIN),
        }
    }

    /// TTL for a result; a host override wins over the pattern TTL
    #[must_use]
    pub fn ttl_for(&self, url: &str, method: DetectionMethod) -> Duration {
        if let Some(ttl) = cache_host(url).and_then(|host| self.domain_ttls.get(&host).copied()) {
            return ttl;
        }
        match self.pattern_ttl {
            Some(ttl) if is_pattern_derived(method) => ttl,
            _ => self.default_ttl,
        }
    }

    #[must_use]
    pub fn is_cacheable(&self, result: &DetectionResult) -> bool {
        if !result.success {
            return false;
        }
        if !result.found && !self.cache_not_found {
            return false;
        }
        if is_pattern_derived(result.method) && !self.cache_pattern_results {
            return false;
        }
        true
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::from_config(&AuthDetectConfig::default())
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub result: DetectionResult,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub max_entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub oldest_entry: Option<DateTime<Utc>>,
    pub newest_entry: Option<DateTime<Utc>>,
}

pub struct ResultCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    policy: CachePolicy,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResultCache {
    #[must_use]
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(policy.max_entries)),
            policy,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Look up a result, refreshing its recency; expired entries are dropped
    pub fn get(&self, url: &str) -> Option<DetectionResult> {
        self.get_entry(url).map(|entry| entry.result)
    }

    /// Like [`get`](Self::get) but includes cache timestamps
    pub fn get_entry(&self, url: &str) -> Option<CacheEntry> {
        let key = normalize_cache_key(url);
        let now = Utc::now();
        let mut entries = self.entries.lock();

        let lookup = entries
            .get(&key)
            .map(|entry| (entry.is_expired(now), entry.clone()));
        let expired = match lookup {
            Some((false, entry)) => {
                drop(entries);
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Result cache hit");
                return Some(entry);
            }
            Some((true, _)) => {
                entries.pop(&key);
                true
            }
            None => false,
        };
        drop(entries);

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, expired, "Result cache miss");
        None
    }

    /// Store a result if the policy allows it; returns whether it was stored
    pub fn set(&self, url: &str, result: &DetectionResult) -> bool {
        if !self.policy.is_cacheable(result) {
            debug!(
                url = %url,
                success = result.success,
                found = result.found,
                "Result not eligible for caching"
            );
            return false;
        }

        let key = normalize_cache_key(url);
        let ttl = self.policy.ttl_for(url, result.method);
        let cached_at = Utc::now();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|delta| cached_at.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let entry = CacheEntry {
            result: result.clone(),
            cached_at,
            expires_at,
        };
        self.entries.lock().put(key.clone(), entry);
        debug!(key = %key, ttl_secs = ttl.as_secs(), "Cached detection result");
        true
    }

    /// Present and unexpired; does not touch recency or counters
    pub fn has(&self, url: &str) -> bool {
        let key = normalize_cache_key(url);
        let now = Utc::now();
        self.entries
            .lock()
            .peek(&key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    pub fn invalidate(&self, url: &str) -> bool {
        let key = normalize_cache_key(url);
        let removed = self.entries.lock().pop(&key).is_some();
        if removed {
            info!(key = %key, "Invalidated cached result");
        }
        removed
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        let count = entries.len();
        entries.clear();
        drop(entries);
        info!(count, "Cleared result cache");
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        let entries = self.entries.lock();
        let oldest_entry = entries.iter().map(|(_, e)| e.cached_at).min();
        let newest_entry = entries.iter().map(|(_, e)| e.cached_at).max();
        let size = entries.len();
        let max_entries = entries.cap().get();
        drop(entries);

        CacheStats {
            size,
            max_entries,
            hits,
            misses,
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
            oldest_entry,
            newest_entry,
        }
    }

    /// Drop every expired entry; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.lock();
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.pop(key);
        }
        expired.len()
    }

    /// Periodically purge expired entries until `shutdown` is cancelled
    pub fn start_cleanup_task(
        self: Arc<Self>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    () = shutdown.cancelled() => {
                        debug!("Result cache cleanup task stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let purged = self.purge_expired();
                        if purged > 0 {
                            info!(purged, "Purged expired cache entries");
                        }
                    }
                }
            }
        })
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}
