// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Two-tier intent classification for Sequin.
//!
//! Incoming messages are routed by intent before any backend call is made.
//! Tier one is a fast pattern classifier over curated regexes; when it is
//! not confident, tier two scores the message against labeled example
//! utterances (embeddings when an [`EmbeddingBackend`] is wired in, token
//! overlap otherwise). Both tiers always return a best guess; the caller
//! decides when to fall through using
//! [`IntentClassifier::is_confident`].
//!
//! Instances are shared per configuration through [`ClassifierRegistry`].
//!
//! [`EmbeddingBackend`]: sequin_core::traits::EmbeddingBackend

#[cfg(feature = "onnx")]
pub mod embedder;
pub mod pattern;
pub mod registry;
pub mod similarity;
pub mod types;

#[cfg(feature = "onnx")]
pub use embedder::OnnxEmbedder;
pub use pattern::PatternClassifier;
pub use registry::ClassifierRegistry;
pub use similarity::SimilarityClassifier;
pub use types::{ClassifierConfig, Intent, IntentClassifier, IntentResult};
