//! Two-tier cache for catalog JSON, ZIP archives, and derived artifacts.
//!
//! The [`CacheTier`] trait abstracts one storage layer; [`TieredCache`]
//! queries tiers in order (fast in-process memory first, then the
//! persistent SQLite tier) and warms earlier tiers on a deeper hit so the
//! next request takes the fast path. A tier failing to read or write is
//! logged and skipped — cache trouble must never fail the request itself.
//!
//! Keys are deterministic strings built from semantic components
//! ([`catalog_key`], [`zip_key`]); the artifact class decides the TTL.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

/// Catalog search results stay fresh for an hour: release metadata changes
/// rarely, but it does change when new versions are published.
pub const CATALOG_TTL_SECS: u64 = 60 * 60;

/// A given tag's ZIP never changes, so archives keep for 30 days; the long
/// TTL avoids redundant multi-megabyte downloads.
pub const ARCHIVE_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Cache key for a catalog search result.
pub fn catalog_key(language: &str, organization: &str, stage: &str) -> String {
    format!("catalog:{}:{}:{}", language, organization, stage)
}

/// Cache key for a repository ZIP archive at a ref.
pub fn zip_key(organization: &str, repository: &str, git_ref: &str) -> String {
    format!("zip:{}/{}:{}", organization, repository, git_ref)
}

/// One storage layer of the cache.
///
/// Implementations must treat `set` as idempotent and safe to race:
/// last-writer-wins is acceptable because every cached artifact is derived
/// deterministically from the same upstream source for a given key.
#[async_trait]
pub trait CacheTier: Send + Sync {
    /// Short tier name for log lines (`"memory"`, `"sqlite"`).
    fn name(&self) -> &str;

    /// Look up a key. `Ok(None)` means miss or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store a value with a TTL in seconds.
    async fn set(&self, key: &str, value: &[u8], ttl_secs: u64) -> Result<()>;
}

// ============ Memory tier ============

struct MemoryEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// In-process tier: a `HashMap` behind `RwLock` with per-entry expiry.
///
/// Unbounded; TTL expiry is the only eviction. Entries are dropped lazily
/// when a read finds them expired.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, MemoryEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (possibly expired, not yet dropped) entries.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheTier for MemoryCache {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let expired = {
            let entries = self.entries.read().unwrap();
            match entries.get(key) {
                None => return Ok(None),
                Some(e) if e.expires_at > Instant::now() => return Ok(Some(e.value.clone())),
                Some(_) => true,
            }
        };
        if expired {
            self.entries.write().unwrap().remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &[u8], ttl_secs: u64) -> Result<()> {
        let entry = MemoryEntry {
            value: value.to_vec(),
            expires_at: Instant::now() + Duration::from_secs(ttl_secs),
        };
        self.entries.write().unwrap().insert(key.to_string(), entry);
        Ok(())
    }
}

// ============ Tiered front ============

/// Queries tiers in order and warms earlier tiers on a deeper hit.
pub struct TieredCache {
    tiers: Vec<Arc<dyn CacheTier>>,
}

impl TieredCache {
    pub fn new(tiers: Vec<Arc<dyn CacheTier>>) -> Self {
        Self { tiers }
    }

    /// Look up a key across all tiers, fastest first.
    ///
    /// On a hit in a later tier the value is written back into every
    /// earlier tier with `warm_ttl_secs` (the artifact class's TTL) so
    /// subsequent requests hit the fast path. Tier errors are logged and
    /// treated as misses.
    pub async fn get(&self, key: &str, warm_ttl_secs: u64) -> Option<Vec<u8>> {
        for (depth, tier) in self.tiers.iter().enumerate() {
            match tier.get(key).await {
                Ok(Some(value)) => {
                    debug!(key, tier = tier.name(), "cache hit");
                    for warm in &self.tiers[..depth] {
                        if let Err(e) = warm.set(key, &value, warm_ttl_secs).await {
                            warn!(key, tier = warm.name(), error = %e, "cache warm failed");
                        }
                    }
                    return Some(value);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(key, tier = tier.name(), error = %e, "cache read failed");
                }
            }
        }
        None
    }

    /// Store a value in every tier. Tier errors are logged, never surfaced.
    pub async fn set(&self, key: &str, value: &[u8], ttl_secs: u64) {
        for tier in &self.tiers {
            if let Err(e) = tier.set(key, value, ttl_secs).await {
                warn!(key, tier = tier.name(), error = %e, "cache write failed");
            }
        }
    }
}
