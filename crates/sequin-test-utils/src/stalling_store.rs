// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value store whose every operation stalls before answering.
//!
//! Used with paused-clock tests to verify that store consumers bound their
//! calls: a hung store must degrade like an outage, never hang the caller.

use std::time::Duration;

use async_trait::async_trait;

use sequin_core::traits::KeyValueStore;
use sequin_core::SequinError;

pub struct StallingStore {
    delay: Duration,
}

impl StallingStore {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl KeyValueStore for StallingStore {
    async fn get(&self, _key: &str) -> Result<Option<serde_json::Value>, SequinError> {
        tokio::time::sleep(self.delay).await;
        Ok(None)
    }

    async fn set(
        &self,
        _key: &str,
        _value: serde_json::Value,
        _ttl: Option<Duration>,
    ) -> Result<(), SequinError> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<bool, SequinError> {
        tokio::time::sleep(self.delay).await;
        Ok(false)
    }

    async fn exists(&self, _key: &str) -> Result<bool, SequinError> {
        tokio::time::sleep(self.delay).await;
        Ok(false)
    }
}
