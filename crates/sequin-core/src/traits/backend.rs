// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation backend trait: natural language plus context in, query and rows out.

use async_trait::async_trait;

use crate::error::SequinError;
use crate::types::Generation;

/// Opaque service that turns a question (with conversation context) into a
/// SQL query, its result rows, and a human-readable interpretation.
///
/// Implementations must execute at most one underlying data query per call
/// and are treated as fallible and possibly slow; callers bound them with
/// timeouts.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, question: &str, context: &str)
        -> Result<Generation, SequinError>;
}
