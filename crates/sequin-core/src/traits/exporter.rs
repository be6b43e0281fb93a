// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Export collaborator trait.

use async_trait::async_trait;

use crate::error::SequinError;
use crate::types::Row;

/// Turns a result-row sequence into a download reference (a path or URL the
/// transport can hand to the user).
#[async_trait]
pub trait Exporter: Send + Sync {
    async fn export(&self, rows: &[Row]) -> Result<String, SequinError>;
}
