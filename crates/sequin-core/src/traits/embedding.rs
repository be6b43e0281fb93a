// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding backend trait for vector embedding generation.

use async_trait::async_trait;

use crate::error::SequinError;

/// Converts text into vector representations for similarity scoring.
///
/// The similarity classifier works without one (token-set Jaccard fallback),
/// so this seam is optional everywhere it appears.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed a batch of texts, one vector per input, all of [`Self::dimensions`] length.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SequinError>;

    /// Dimensionality of the produced vectors.
    fn dimensions(&self) -> usize;
}
