// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! All traits use `#[async_trait]` for dynamic dispatch compatibility; the
//! orchestrator and the conversation layer only ever see these seams, never
//! concrete backends.

pub mod backend;
pub mod embedding;
pub mod exporter;
pub mod store;

pub use backend::GenerationBackend;
pub use embedding::EmbeddingBackend;
pub use exporter::Exporter;
pub use store::KeyValueStore;
