// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types shared across the Sequin workspace.

use thiserror::Error;

/// The primary error type used across Sequin adapter traits and core operations.
#[derive(Debug, Error)]
pub enum SequinError {
    /// Configuration errors (invalid TOML, bad thresholds, missing fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Shared store errors (backend unreachable, serialization failure).
    ///
    /// The store is a soft dependency: callers layered on top of it convert
    /// this into `false`/`None` returns and keep serving in degraded mode.
    #[error("store error: {source}")]
    Store {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Generation backend errors (API failure, bad status, unreachable host).
    #[error("backend error: {message}")]
    Backend {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Export collaborator errors (I/O failure, empty result set).
    #[error("export error: {message}")]
    Export {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A bounded call to a collaborator exceeded its deadline.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// The backend's structured reply was not well-formed and recovery from
    /// the tool-call trace also failed.
    #[error("malformed backend reply: {0}")]
    Parse(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
