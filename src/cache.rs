use crate::{store::KeyValueStore, LookupRecord};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn};

/// Stored form of a cached record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: LookupRecord,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl CacheEntry {
    fn is_expired(&self, now_ms: i64, ttl: Duration) -> bool {
        now_ms.saturating_sub(self.timestamp) >= ttl_millis(ttl)
    }
}

fn ttl_millis(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
}

/// Time-boxed record cache keyed by domain.
///
/// Storage problems are logged and treated as a miss (on read) or a skipped
/// write; they never reach the caller.
pub struct ResultCache {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(&self, domain: &str) -> Option<LookupRecord> {
        self.get_at(domain, Utc::now().timestamp_millis()).await
    }

    pub async fn set(&self, domain: &str, record: &LookupRecord) {
        self.set_at(domain, record, Utc::now().timestamp_millis()).await
    }

    /// Read `domain` as of `now_ms`.
    pub async fn get_at(&self, domain: &str, now_ms: i64) -> Option<LookupRecord> {
        let raw = match self.store.get(domain).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Cache miss for domain: {}", domain);
                return None;
            }
            Err(e) => {
                warn!("Cache read error for {}: {}", domain, e);
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_value(raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Discarding unreadable cache entry for {}: {}", domain, e);
                return None;
            }
        };

        if entry.is_expired(now_ms, self.ttl) {
            debug!(domain, age_ms = now_ms.saturating_sub(entry.timestamp), "Cache entry expired");
            return None;
        }

        debug!("Cache hit for domain: {}", domain);
        Some(entry.data)
    }

    /// Write `record` under `domain`, stamped with `now_ms`.
    pub async fn set_at(&self, domain: &str, record: &LookupRecord, now_ms: i64) {
        let entry = CacheEntry {
            data: record.clone(),
            timestamp: now_ms,
        };

        let value = match serde_json::to_value(&entry) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to encode cache entry for {}: {}", domain, e);
                return;
            }
        };

        match self.store.set(domain, value).await {
            Ok(()) => info!("Cached result for domain: {}", domain),
            Err(e) => warn!("Failed to cache result for {}: {}", domain, e),
        }
    }
}
