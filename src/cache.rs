//! TTL-bounded result cache.
//!
//! [`CacheStore`] is the raw key/value substrate (in-memory by default).
//! [`ResultCache`] layers the typed, schema-versioned view used by the
//! resolver on top of it. Expiry is passive: expired entries read as absent
//! and are dropped lazily.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::trailer::ResolutionResult;

/// Bump whenever [`ResolutionResult`] or its link/descriptor shape changes.
/// It is part of every key and stored in every envelope, so entries written
/// with an older shape are never deserialized as the current one.
pub const SCHEMA_VERSION: u32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("failed to encode cache entry: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Opaque key/value store with per-entry time-to-live.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

struct MemoryEntry {
    value: String,
    inserted_at: Instant,
    /// `None` when the TTL reaches past the clock's range.
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// Thread-safe in-memory store.
pub struct MemoryCache {
    entries: DashMap<String, MemoryEntry>,
    max_entries: usize,
}

impl MemoryCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: max_entries.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove expired entries.
    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.is_live(now));
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.inserted_at)
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        }
        Ok(None)
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        if !self.entries.contains_key(key) && self.entries.len() >= self.max_entries {
            self.cleanup_expired();
            if self.entries.len() >= self.max_entries {
                self.evict_oldest();
            }
        }

        let now = Instant::now();
        self.entries.insert(
            key.to_string(),
            MemoryEntry {
                value,
                inserted_at: now,
                expires_at: now.checked_add(ttl),
            },
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Typed view
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct CacheEnvelope {
    schema_version: u32,
    result: ResolutionResult,
}

/// Cache key for an identifier under the current schema version.
pub fn cache_key(id: &str) -> String {
    format!("trailer:v{SCHEMA_VERSION}:{id}")
}

/// Schema-versioned [`ResolutionResult`] cache. Backend failures degrade to
/// misses and skipped writes; they never fail a request.
#[derive(Clone)]
pub struct ResultCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// In-memory cache holding at most `max_entries` results.
    pub fn in_memory(max_entries: usize, ttl: Duration) -> Self {
        Self::new(Arc::new(MemoryCache::new(max_entries)), ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn load(&self, id: &str) -> Option<ResolutionResult> {
        let key = cache_key(id);
        let raw = match self.store.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str::<CacheEnvelope>(&raw) {
            Ok(envelope) if envelope.schema_version == SCHEMA_VERSION => Some(envelope.result),
            Ok(envelope) => {
                debug!(
                    key = %key,
                    stored = envelope.schema_version,
                    current = SCHEMA_VERSION,
                    "ignoring cache entry with stale schema"
                );
                None
            }
            Err(e) => {
                debug!(key = %key, error = %e, "ignoring undecodable cache entry");
                None
            }
        }
    }

    pub async fn store(&self, id: &str, result: &ResolutionResult) {
        let key = cache_key(id);
        let envelope = CacheEnvelope {
            schema_version: SCHEMA_VERSION,
            result: result.clone(),
        };

        let outcome = match serde_json::to_string(&envelope) {
            Ok(raw) => self.store.put(&key, raw, self.ttl).await,
            Err(e) => Err(CacheError::from(e)),
        };
        if let Err(e) = outcome {
            warn!(key = %key, error = %e, "cache write failed");
        }
    }
}
