// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory key-value store with per-entry expiry.
//!
//! The default store backend. Expiry is lazy: entries are dropped when a
//! read finds them stale, with [`MemoryStore::purge_expired`] available for
//! explicit sweeps. Suitable for single-process deployments; a networked
//! store can replace it behind [`KeyValueStore`] without touching callers.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use sequin_core::traits::KeyValueStore;
use sequin_core::SequinError;

struct Entry {
    value: serde_json::Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

/// Process-local [`KeyValueStore`] over a concurrent hash map.
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
    /// Applied when a write passes no TTL. `None` means such entries never
    /// expire.
    default_ttl: Option<Duration>,
}

impl MemoryStore {
    /// A store whose untagged writes never expire.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl: None,
        }
    }

    /// A store applying `ttl` to writes that pass no explicit TTL.
    pub fn with_default_ttl(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl: Some(ttl),
        }
    }

    /// Drop every expired entry now; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let purged = before - self.entries.len();
        if purged > 0 {
            debug!(purged, "expired entries purged");
        }
        purged
    }

    /// Number of entries currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, SequinError> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired(Instant::now()) {
                return Ok(Some(entry.value.clone()));
            }
        }
        // Stale or missing. Remove lazily outside the read guard.
        self.entries
            .remove_if(key, |_, entry| entry.is_expired(Instant::now()));
        Ok(None)
    }

    async fn set(
        &self,
        key: &str,
        value: serde_json::Value,
        ttl: Option<Duration>,
    ) -> Result<(), SequinError> {
        let expires_at = ttl
            .or(self.default_ttl)
            .map(|ttl| Instant::now() + ttl);
        self.entries
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, SequinError> {
        match self.entries.remove(key) {
            Some((_, entry)) => Ok(!entry.is_expired(Instant::now())),
            None => Ok(false),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, SequinError> {
        Ok(self.get(key).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_get_round_trip() {
        let store = MemoryStore::new();
        store.set("k", json!({"a": 1}), None).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!({"a": 1})));
    }

    #[tokio::test]
    async fn missing_key_is_none_not_error() {
        let store = MemoryStore::new();
        assert_eq!(store.get("nope").await.unwrap(), None);
        assert!(!store.exists("nope").await.unwrap());
    }

    #[tokio::test]
    async fn set_replaces_prior_value() {
        let store = MemoryStore::new();
        store.set("k", json!(1), None).await.unwrap();
        store.set("k", json!(2), None).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!(2)));
    }

    #[tokio::test]
    async fn delete_reports_existence() {
        let store = MemoryStore::new();
        store.set("k", json!(true), None).await.unwrap();
        assert!(store.delete("k").await.unwrap());
        assert!(!store.delete("k").await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_entry_reads_as_absent() {
        let store = MemoryStore::new();
        store
            .set("k", json!("v"), Some(Duration::from_millis(0)))
            .await
            .unwrap();
        // Zero TTL expires immediately.
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(!store.exists("k").await.unwrap());
        // The lazy removal actually dropped the entry.
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn default_ttl_applies_to_untagged_writes() {
        let store = MemoryStore::with_default_ttl(Duration::from_millis(0));
        store.set("short", json!(1), None).await.unwrap();
        store
            .set("long", json!(2), Some(Duration::from_secs(3600)))
            .await
            .unwrap();
        assert_eq!(store.get("short").await.unwrap(), None);
        assert_eq!(store.get("long").await.unwrap(), Some(json!(2)));
    }

    #[tokio::test]
    async fn purge_expired_sweeps() {
        let store = MemoryStore::new();
        store
            .set("stale", json!(1), Some(Duration::from_millis(0)))
            .await
            .unwrap();
        store.set("live", json!(2), None).await.unwrap();
        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn delete_of_expired_entry_reports_false() {
        let store = MemoryStore::new();
        store
            .set("k", json!(1), Some(Duration::from_millis(0)))
            .await
            .unwrap();
        assert!(!store.delete("k").await.unwrap());
    }
}
