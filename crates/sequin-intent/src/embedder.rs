// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local ONNX sentence embedder (all-MiniLM-L6-v2).
//!
//! Runs inference on CPU with no external API calls. Built only with the
//! `onnx` feature; without it the similarity classifier stays on the token
//! overlap path.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use ndarray::Array2;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;

use sequin_core::traits::EmbeddingBackend;
use sequin_core::SequinError;

/// Output dimensionality of all-MiniLM-L6-v2.
pub const EMBEDDING_DIM: usize = 384;

/// Sentence embedder over a local ONNX model file.
///
/// Expects `tokenizer.json` next to the model file. Inference is
/// single-threaded and serialized through the session lock.
pub struct OnnxEmbedder {
    // Session is not Sync; the Mutex serializes inference.
    session: Mutex<Session>,
    tokenizer: tokenizers::Tokenizer,
}

// Safety: the session is only touched under the Mutex, and the tokenizer is
// thread-safe for encoding.
unsafe impl Send for OnnxEmbedder {}
unsafe impl Sync for OnnxEmbedder {}

fn internal(context: &str, e: impl std::fmt::Display) -> SequinError {
    SequinError::Internal(format!("{context}: {e}"))
}

impl OnnxEmbedder {
    /// Load the model and its sibling `tokenizer.json` from disk.
    pub fn new(model_path: &Path) -> Result<Self, SequinError> {
        let model_dir = model_path
            .parent()
            .ok_or_else(|| SequinError::Internal("invalid model path".to_string()))?;

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            internal(
                &format!("failed to load tokenizer from {}", tokenizer_path.display()),
                e,
            )
        })?;

        let session = Session::builder()
            .map_err(|e| internal("failed to create session builder", e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| internal("failed to set optimization level", e))?
            .with_intra_threads(1)
            .map_err(|e| internal("failed to set thread count", e))?
            .commit_from_file(model_path)
            .map_err(|e| {
                internal(
                    &format!("failed to load model from {}", model_path.display()),
                    e,
                )
            })?;

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    /// Embed one text into a normalized [`EMBEDDING_DIM`] vector.
    fn embed_one(&self, text: &str) -> Result<Vec<f32>, SequinError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| internal("tokenization failed", e))?;

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let token_type_ids: Vec<i64> =
            encoding.get_type_ids().iter().map(|&t| t as i64).collect();

        let seq_len = input_ids.len();

        let input_ids_array = Array2::from_shape_vec((1, seq_len), input_ids)
            .map_err(|e| internal("failed to shape input_ids", e))?;
        let attention_mask_array = Array2::from_shape_vec((1, seq_len), attention_mask.clone())
            .map_err(|e| internal("failed to shape attention_mask", e))?;
        let token_type_ids_array = Array2::from_shape_vec((1, seq_len), token_type_ids)
            .map_err(|e| internal("failed to shape token_type_ids", e))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| internal("failed to lock session", e))?;

        let input_ids_tensor = TensorRef::from_array_view(&input_ids_array)
            .map_err(|e| internal("failed to build input_ids tensor", e))?;
        let attention_mask_tensor = TensorRef::from_array_view(&attention_mask_array)
            .map_err(|e| internal("failed to build attention_mask tensor", e))?;
        let token_type_ids_tensor = TensorRef::from_array_view(&token_type_ids_array)
            .map_err(|e| internal("failed to build token_type_ids tensor", e))?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor,
                "token_type_ids" => token_type_ids_tensor
            ])
            .map_err(|e| internal("inference failed", e))?;

        // Output shape is [1, seq_len, hidden].
        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| internal("failed to extract output tensor", e))?;

        let hidden_size = shape[shape.len() - 1] as usize;
        let pooled = mean_pool_with_attention(data, &attention_mask, seq_len, hidden_size);
        Ok(l2_normalize(&pooled))
    }
}

#[async_trait]
impl EmbeddingBackend for OnnxEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SequinError> {
        texts.iter().map(|t| self.embed_one(t)).collect()
    }

    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }
}

/// Attention-masked mean pooling over token embeddings.
fn mean_pool_with_attention(
    embeddings: &[f32],
    attention_mask: &[i64],
    seq_len: usize,
    hidden_size: usize,
) -> Vec<f32> {
    let mut sum = vec![0.0f32; hidden_size];
    let mut count = 0.0f32;

    for i in 0..seq_len {
        if attention_mask[i] > 0 {
            for j in 0..hidden_size {
                sum[j] += embeddings[i * hidden_size + j];
            }
            count += 1.0;
        }
    }

    if count > 0.0 {
        for val in &mut sum {
            *val /= count;
        }
    }

    sum
}

/// L2-normalize; zero-norm vectors pass through unchanged.
fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm: f32 = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        vec.iter().map(|v| v / norm).collect()
    } else {
        vec.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_pool_respects_attention_mask() {
        // Two tokens, hidden size 2, second token masked out.
        let embeddings = [1.0, 2.0, 100.0, 200.0];
        let mask = [1i64, 0];
        let pooled = mean_pool_with_attention(&embeddings, &mask, 2, 2);
        assert_eq!(pooled, vec![1.0, 2.0]);
    }

    #[test]
    fn mean_pool_averages_unmasked_tokens() {
        let embeddings = [1.0, 2.0, 3.0, 4.0];
        let mask = [1i64, 1];
        let pooled = mean_pool_with_attention(&embeddings, &mask, 2, 2);
        assert_eq!(pooled, vec![2.0, 3.0]);
    }

    #[test]
    fn mean_pool_all_masked_is_zero() {
        let embeddings = [1.0, 2.0];
        let mask = [0i64];
        assert_eq!(mean_pool_with_attention(&embeddings, &mask, 1, 2), vec![0.0, 0.0]);
    }

    #[test]
    fn l2_normalize_unit_length() {
        let normalized = l2_normalize(&[3.0, 4.0]);
        let norm: f32 = normalized.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn l2_normalize_zero_vector_unchanged() {
        assert_eq!(l2_normalize(&[0.0, 0.0]), vec![0.0, 0.0]);
    }
}
