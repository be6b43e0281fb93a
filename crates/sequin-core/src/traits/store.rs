// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared expiring key-value store trait.
//!
//! Backs both the conversation store and the result cache under distinct key
//! namespaces (`history:{session}`, `stats:{session}`, `result:{session}:*`).

use std::time::Duration;

use async_trait::async_trait;

use crate::error::SequinError;

/// Generic get/set/delete-with-TTL store keyed by string.
///
/// Values are JSON so any backend (in-memory, Redis, ...) can hold message
/// lists, stats records, and cached result rows interchangeably.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Point read. Absence is `Ok(None)`, not an error.
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, SequinError>;

    /// Write a value, replacing any prior one. `None` TTL means the backend's
    /// default expiry applies.
    async fn set(
        &self,
        key: &str,
        value: serde_json::Value,
        ttl: Option<Duration>,
    ) -> Result<(), SequinError>;

    /// Delete a key; returns whether it existed.
    async fn delete(&self, key: &str) -> Result<bool, SequinError>;

    /// Whether a live (non-expired) entry exists for the key.
    async fn exists(&self, key: &str) -> Result<bool, SequinError>;
}
