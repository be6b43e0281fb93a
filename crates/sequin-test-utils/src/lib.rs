// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock collaborators for Sequin integration tests.
//!
//! Everything here is deterministic and CI-runnable: no external services,
//! no model files, no network.
//!
//! # Components
//!
//! - [`MockGenerationBackend`] - scripted generation outcomes with call capture
//! - [`MockExporter`] - fixed-reference exporter with export capture
//! - [`StubEmbedder`] / [`FailingEmbedder`] - deterministic embedding vectors
//! - [`FailingStore`] - key-value store in permanent outage
//! - [`StallingStore`] - key-value store that stalls every operation

pub mod failing_store;
pub mod mock_backend;
pub mod mock_exporter;
pub mod stalling_store;
pub mod stub_embedder;

pub use failing_store::FailingStore;
pub use mock_backend::MockGenerationBackend;
pub use mock_exporter::MockExporter;
pub use stalling_store::StallingStore;
pub use stub_embedder::{FailingEmbedder, StubEmbedder};
