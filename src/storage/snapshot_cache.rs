// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Snapshot cache port and an in-process LRU adapter.
//!
//! The cache maps an arbitrary string key to a serialized snapshot. It is
//! advisory only: every entry carries a TTL and the store stays the system
//! of record.
//!
//! Keys written together through [`SnapshotCache::put_group`] share one
//! lifetime in the LRU adapter: capacity eviction, expiry or an explicit
//! evict of any member drops every member.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;

/// Errors surfaced by cache adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// Cache backend is unavailable or in a broken state.
    #[error("cache backend failure: {0}")]
    Backend(String),
    /// A snapshot could not be serialized for storage.
    #[error("snapshot encoding failed: {0}")]
    Encoding(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache port: string key to serialized snapshot.
#[async_trait]
pub trait SnapshotCache: Send + Sync {
    /// Get a live snapshot. Expired entries read as absent.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store a snapshot under `key` for `ttl`, replacing any previous value.
    async fn put(&self, key: &str, snapshot: String, ttl: Duration) -> CacheResult<()>;

    /// Store one snapshot under every key in `keys`. Adapters that can drop
    /// entries on their own must drop the whole group, never a subset.
    async fn put_group(&self, keys: &[&str], snapshot: String, ttl: Duration) -> CacheResult<()> {
        for key in keys {
            self.put(key, snapshot.clone(), ttl).await?;
        }
        Ok(())
    }

    /// Remove `key`. Evicting an absent key is not an error.
    async fn evict(&self, key: &str) -> CacheResult<()>;
}

/// Cached entry: snapshot + expiry bookkeeping.
struct CacheEntry {
    snapshot: String,
    inserted_at: Instant,
    ttl: Duration,
    /// Keys stored together with this one, itself included. Empty for a
    /// standalone `put`.
    group: Vec<String>,
}

impl CacheEntry {
    fn is_live(&self) -> bool {
        self.inserted_at.elapsed() < self.ttl
    }
}

/// In-process LRU cache with per-entry TTL.
pub struct LruSnapshotCache {
    cache: Mutex<LruCache<String, CacheEntry>>,
}

impl LruSnapshotCache {
    /// Create a new cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    fn lock(&self) -> CacheResult<std::sync::MutexGuard<'_, LruCache<String, CacheEntry>>> {
        self.cache
            .lock()
            .map_err(|_| CacheError::Backend("snapshot cache lock poisoned".to_string()))
    }
}

type Entries = LruCache<String, CacheEntry>;

/// Insert `entry`; if the LRU pushed another entry out, drop its group.
fn insert(cache: &mut Entries, key: &str, entry: CacheEntry) {
    if let Some((evicted_key, evicted)) = cache.push(key.to_string(), entry) {
        // `push` also hands back the old value when `key` was replaced
        if evicted_key != key {
            drop_group(cache, evicted.group);
        }
    }
}

/// Pop `key` together with every key reachable through group membership.
fn drop_entry(cache: &mut Entries, key: &str) {
    if let Some(entry) = cache.pop(key) {
        drop_group(cache, entry.group);
    }
}

fn drop_group(cache: &mut Entries, mut pending: Vec<String>) {
    while let Some(key) = pending.pop() {
        if let Some(entry) = cache.pop(&key) {
            pending.extend(entry.group);
        }
    }
}

#[async_trait]
impl SnapshotCache for LruSnapshotCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut cache = self.lock()?;
        if let Some(entry) = cache.get(key) {
            if entry.is_live() {
                return Ok(Some(entry.snapshot.clone()));
            }
            // Expired, drop it with its group
            drop_entry(&mut cache, key);
        }
        Ok(None)
    }

    async fn put(&self, key: &str, snapshot: String, ttl: Duration) -> CacheResult<()> {
        let mut cache = self.lock()?;
        insert(
            &mut cache,
            key,
            CacheEntry {
                snapshot,
                inserted_at: Instant::now(),
                ttl,
                group: Vec::new(),
            },
        );
        Ok(())
    }

    async fn put_group(&self, keys: &[&str], snapshot: String, ttl: Duration) -> CacheResult<()> {
        let group: Vec<String> = keys.iter().map(|key| key.to_string()).collect();
        let inserted_at = Instant::now();
        let mut cache = self.lock()?;
        for key in keys {
            insert(
                &mut cache,
                key,
                CacheEntry {
                    snapshot: snapshot.clone(),
                    inserted_at,
                    ttl,
                    group: group.clone(),
                },
            );
        }
        Ok(())
    }

    async fn evict(&self, key: &str) -> CacheResult<()> {
        let mut cache = self.lock()?;
        drop_entry(&mut cache, key);
        Ok(())
    }
}
