// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic embedding stub.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;

use sequin_core::traits::EmbeddingBackend;
use sequin_core::SequinError;

const DIM: usize = 32;

/// Hash-bucketed bag-of-words embedder.
///
/// Each word is hashed into one of 32 buckets and the vector is
/// L2-normalized, so identical texts embed identically and texts sharing
/// words land close together. No model files, no I/O, fully deterministic.
pub struct StubEmbedder;

impl StubEmbedder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StubEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingBackend for StubEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SequinError> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut vector = vec![0.0f32; DIM];
                for word in text.to_lowercase().split_whitespace() {
                    let mut hasher = DefaultHasher::new();
                    word.hash(&mut hasher);
                    vector[(hasher.finish() % DIM as u64) as usize] += 1.0;
                }
                let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
                if norm > 0.0 {
                    for v in &mut vector {
                        *v /= norm;
                    }
                }
                vector
            })
            .collect())
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// An embedder whose every call fails, for exercising degraded paths.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingBackend for FailingEmbedder {
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, SequinError> {
        Err(SequinError::Internal("embedder offline".to_string()))
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}
