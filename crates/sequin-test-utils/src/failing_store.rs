// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value store whose every operation fails.
//!
//! Used to verify that store consumers degrade softly (`false`/`None`
//! returns) instead of propagating store outages to the user.

use std::time::Duration;

use async_trait::async_trait;

use sequin_core::traits::KeyValueStore;
use sequin_core::SequinError;

pub struct FailingStore;

fn outage() -> SequinError {
    SequinError::Store {
        source: "store unreachable".into(),
    }
}

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<serde_json::Value>, SequinError> {
        Err(outage())
    }

    async fn set(
        &self,
        _key: &str,
        _value: serde_json::Value,
        _ttl: Option<Duration>,
    ) -> Result<(), SequinError> {
        Err(outage())
    }

    async fn delete(&self, _key: &str) -> Result<bool, SequinError> {
        Err(outage())
    }

    async fn exists(&self, _key: &str) -> Result<bool, SequinError> {
        Err(outage())
    }
}
