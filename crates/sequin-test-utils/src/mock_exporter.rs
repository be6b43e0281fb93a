// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock export collaborator.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use sequin_core::traits::Exporter;
use sequin_core::{Row, SequinError};

/// An exporter that returns a fixed download reference and records what it
/// was asked to export.
pub struct MockExporter {
    reference: String,
    fail: bool,
    exports: Arc<Mutex<Vec<Vec<Row>>>>,
}

impl MockExporter {
    pub fn new() -> Self {
        Self {
            reference: "/tmp/export.csv".to_string(),
            fail: false,
            exports: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_reference(reference: &str) -> Self {
        Self {
            reference: reference.to_string(),
            ..Self::new()
        }
    }

    /// An exporter whose every call fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Every row set this exporter has received, in order.
    pub async fn exports(&self) -> Vec<Vec<Row>> {
        self.exports.lock().await.clone()
    }
}

impl Default for MockExporter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Exporter for MockExporter {
    async fn export(&self, rows: &[Row]) -> Result<String, SequinError> {
        if self.fail {
            return Err(SequinError::Export {
                message: "disk full".to_string(),
                source: None,
            });
        }
        self.exports.lock().await.push(rows.to_vec());
        Ok(self.reference.clone())
    }
}
