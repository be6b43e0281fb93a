// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Similarity-based intent classification.
//!
//! Second tier: scores the input against a curated arena of labeled example
//! utterances. With an embedding backend available the score is cosine
//! similarity over vectors; without one (or when embedding fails mid-flight)
//! it degrades to token-set Jaccard overlap. Which method produced a result
//! is always recorded in the result metadata.

use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use sequin_core::traits::EmbeddingBackend;

use crate::types::{ClassifierConfig, Intent, IntentClassifier, IntentResult};

/// One labeled example utterance, with its vector when embedding succeeded.
#[derive(Clone)]
struct ExampleEntry {
    intent: Intent,
    text: String,
    vector: Option<Vec<f32>>,
}

/// Immutable snapshot of the example set. Mutation replaces the whole arena
/// through the `ArcSwap`; in-flight classifications keep scoring against the
/// snapshot they loaded.
#[derive(Default)]
struct ExampleArena {
    entries: Vec<ExampleEntry>,
}

/// Built-in example utterances per intent.
///
/// `unknown` has none on purpose: it is a fallback label, not something we
/// want inputs pulled toward.
fn default_examples() -> Vec<(Intent, &'static str)> {
    vec![
        (Intent::Greeting, "hello there"),
        (Intent::Greeting, "hi, how are you"),
        (Intent::Greeting, "good morning"),
        (Intent::Greeting, "hey bot"),
        (Intent::SqlQuery, "how many installs did we get last week"),
        (Intent::SqlQuery, "what are the top apps by revenue"),
        (Intent::SqlQuery, "show daily active users for march"),
        (Intent::SqlQuery, "which country has the most downloads"),
        (Intent::SqlQuery, "average session length by platform"),
        (Intent::ShowSql, "show me the sql you used"),
        (Intent::ShowSql, "what query did you run"),
        (Intent::ShowSql, "display the underlying sql"),
        (Intent::ExportCsv, "export that to csv"),
        (Intent::ExportCsv, "download the results as a file"),
        (Intent::ExportCsv, "save this table for me"),
    ]
}

/// Example-driven intent classifier with an embedding fast path and a
/// token-overlap fallback.
pub struct SimilarityClassifier {
    config: ClassifierConfig,
    embedder: Option<Arc<dyn EmbeddingBackend>>,
    arena: ArcSwap<ExampleArena>,
}

impl SimilarityClassifier {
    /// Create a classifier over the built-in example set.
    pub async fn new(
        config: ClassifierConfig,
        embedder: Option<Arc<dyn EmbeddingBackend>>,
    ) -> Self {
        let examples = default_examples()
            .into_iter()
            .map(|(intent, text)| (intent, text.to_string()))
            .collect();
        Self::with_examples(config, embedder, examples).await
    }

    /// Create a classifier from explicit (intent, utterance) pairs.
    ///
    /// All examples are embedded in one batch call. If embedding fails the
    /// classifier still comes up, permanently on the Jaccard path for these
    /// entries, and the failure is logged.
    pub async fn with_examples(
        config: ClassifierConfig,
        embedder: Option<Arc<dyn EmbeddingBackend>>,
        examples: Vec<(Intent, String)>,
    ) -> Self {
        let vectors = match &embedder {
            Some(embedder) if !examples.is_empty() => {
                let texts: Vec<String> = examples.iter().map(|(_, t)| normalize(t)).collect();
                match embedder.embed(&texts).await {
                    Ok(vectors) if vectors.len() == examples.len() => {
                        Some(vectors.into_iter().map(Some).collect::<Vec<_>>())
                    }
                    Ok(vectors) => {
                        error!(
                            expected = examples.len(),
                            got = vectors.len(),
                            "embedder returned wrong batch size, using token overlap"
                        );
                        None
                    }
                    Err(e) => {
                        error!(error = %e, "failed to embed examples, using token overlap");
                        None
                    }
                }
            }
            _ => None,
        };

        let entries = examples
            .into_iter()
            .enumerate()
            .map(|(i, (intent, text))| ExampleEntry {
                intent,
                text,
                vector: vectors.as_ref().and_then(|v| v[i].clone()),
            })
            .collect::<Vec<_>>();

        info!(
            examples = entries.len(),
            embedded = vectors.is_some(),
            "similarity classifier initialized"
        );
        Self {
            config,
            embedder,
            arena: ArcSwap::from_pointee(ExampleArena { entries }),
        }
    }

    /// Create a classifier from a JSON file of intent name -> list of
    /// utterances. Unreadable files and unknown intent names are logged and
    /// skipped.
    pub async fn from_file(
        config: ClassifierConfig,
        embedder: Option<Arc<dyn EmbeddingBackend>>,
        path: &Path,
    ) -> Self {
        let raw: std::collections::HashMap<String, Vec<String>> =
            match std::fs::read_to_string(path)
                .map_err(|e| e.to_string())
                .and_then(|s| serde_json::from_str(&s).map_err(|e| e.to_string()))
            {
                Ok(map) => map,
                Err(e) => {
                    error!(path = %path.display(), error = %e, "failed to load examples file");
                    Default::default()
                }
            };

        let mut examples = Vec::new();
        for (name, texts) in raw {
            match Intent::from_str(&name) {
                Ok(intent) => examples.extend(texts.into_iter().map(|t| (intent, t))),
                Err(_) => warn!(intent = %name, "examples exist for unsupported intent"),
            }
        }
        Self::with_examples(config, embedder, examples).await
    }

    /// Classify the input by similarity to the example arena.
    ///
    /// An empty arena, or one in which nothing scores above zero, falls back
    /// to `sql_query` at 0.1 so the message still reaches the query path.
    pub async fn classify(&self, text: &str) -> IntentResult {
        let normalized = normalize(text);
        let arena = self.arena.load();

        if normalized.is_empty() || arena.entries.is_empty() {
            return fallback_result("no examples to compare against");
        }

        // One embed call for the query, shared across the whole scan. A
        // failure here downgrades this classification only.
        let query_vector = match &self.embedder {
            Some(embedder) => match embedder.embed(std::slice::from_ref(&normalized)).await {
                Ok(mut vectors) if !vectors.is_empty() => Some(vectors.swap_remove(0)),
                Ok(_) => None,
                Err(e) => {
                    warn!(error = %e, "query embedding failed, using token overlap");
                    None
                }
            },
            None => None,
        };

        let mut best: Option<(&ExampleEntry, f32, &'static str)> = None;
        for entry in &arena.entries {
            let (score, method) = match (&query_vector, &entry.vector) {
                (Some(q), Some(v)) => (cosine_similarity(q, v).max(0.0), "embedding"),
                _ => (jaccard(&normalized, &normalize(&entry.text)), "jaccard"),
            };
            if best.as_ref().is_none_or(|(_, s, _)| score > *s) {
                best = Some((entry, score, method));
            }
        }

        match best {
            Some((entry, score, method)) if score > 0.0 => {
                debug!(intent = %entry.intent, score, method, "similarity match");
                let mut metadata = serde_json::Map::new();
                metadata.insert("classifier".into(), "similarity".into());
                metadata.insert("similarity_method".into(), method.into());
                metadata.insert("best_example".into(), entry.text.clone().into());
                metadata.insert("best_score".into(), serde_json::json!(score));
                IntentResult {
                    intent: entry.intent,
                    confidence: score.min(1.0),
                    metadata,
                }
            }
            _ => fallback_result("no example scored above zero"),
        }
    }

    /// Add one example utterance, embedding only the new text.
    ///
    /// Returns `false` (and logs) if the embedder rejects the text; the
    /// arena is left untouched in that case.
    pub async fn add_example(&self, intent: Intent, text: &str) -> bool {
        let vector = match &self.embedder {
            Some(embedder) => {
                match embedder.embed(std::slice::from_ref(&normalize(text))).await {
                    Ok(mut vectors) if !vectors.is_empty() => Some(vectors.swap_remove(0)),
                    Ok(_) => None,
                    Err(e) => {
                        error!(%intent, error = %e, "failed to embed new example");
                        return false;
                    }
                }
            }
            None => None,
        };

        let entry = ExampleEntry {
            intent,
            text: text.to_string(),
            vector,
        };
        self.arena.rcu(|arena| {
            let mut entries = arena.entries.clone();
            entries.push(entry.clone());
            ExampleArena { entries }
        });
        info!(%intent, "example added");
        true
    }

    /// Remove an example by exact text match; returns whether one existed.
    pub fn remove_example(&self, intent: Intent, text: &str) -> bool {
        let mut removed = false;
        self.arena.rcu(|arena| {
            let entries: Vec<ExampleEntry> = arena
                .entries
                .iter()
                .filter(|e| !(e.intent == intent && e.text == text))
                .cloned()
                .collect();
            removed = entries.len() < arena.entries.len();
            ExampleArena { entries }
        });
        if removed {
            info!(%intent, "example removed");
        }
        removed
    }

    /// The example utterances currently labeled with an intent.
    pub fn examples_for(&self, intent: Intent) -> Vec<String> {
        self.arena
            .load()
            .entries
            .iter()
            .filter(|e| e.intent == intent)
            .map(|e| e.text.clone())
            .collect()
    }

    /// Total number of examples in the arena.
    pub fn example_count(&self) -> usize {
        self.arena.load().entries.len()
    }
}

#[async_trait]
impl IntentClassifier for SimilarityClassifier {
    async fn classify(&self, text: &str) -> IntentResult {
        SimilarityClassifier::classify(self, text).await
    }

    fn config(&self) -> &ClassifierConfig {
        &self.config
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

fn fallback_result(reason: &str) -> IntentResult {
    let mut metadata = serde_json::Map::new();
    metadata.insert("classifier".into(), "similarity".into());
    metadata.insert("fallback_reason".into(), reason.into());
    IntentResult {
        intent: Intent::SqlQuery,
        confidence: 0.1,
        metadata,
    }
}

/// Word-set overlap in [0, 1]. Both-empty inputs score 0.
fn jaccard(a: &str, b: &str) -> f32 {
    let set_a: HashSet<&str> = a.split_whitespace().collect();
    let set_b: HashSet<&str> = b.split_whitespace().collect();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 0.0;
    }
    set_a.intersection(&set_b).count() as f32 / union as f32
}

/// Cosine similarity; 0 for mismatched lengths or zero-norm inputs.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sequin_test_utils::StubEmbedder;

    async fn jaccard_classifier() -> SimilarityClassifier {
        SimilarityClassifier::new(ClassifierConfig::similarity(), None).await
    }

    async fn embedded_classifier() -> SimilarityClassifier {
        SimilarityClassifier::new(
            ClassifierConfig::similarity(),
            Some(Arc::new(StubEmbedder::new())),
        )
        .await
    }

    #[test]
    fn jaccard_basics() {
        assert_eq!(jaccard("a b c", "a b c"), 1.0);
        assert_eq!(jaccard("a b", "c d"), 0.0);
        assert_eq!(jaccard("", ""), 0.0);
        let half = jaccard("show sql", "show tables");
        assert!(half > 0.0 && half < 1.0);
    }

    #[test]
    fn cosine_guards() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn exact_example_scores_full_confidence() {
        let c = jaccard_classifier().await;
        let result = c.classify("what query did you run").await;
        assert_eq!(result.intent, Intent::ShowSql);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.metadata["similarity_method"], "jaccard");
        assert!(c.is_confident(&result));
    }

    #[tokio::test]
    async fn near_example_classified_by_overlap() {
        let c = jaccard_classifier().await;
        let result = c.classify("how many installs last week").await;
        assert_eq!(result.intent, Intent::SqlQuery);
        assert!(result.confidence > 0.4);
    }

    #[tokio::test]
    async fn no_overlap_falls_back_to_sql_query() {
        let c = jaccard_classifier().await;
        let result = c.classify("zzzz qqqq xxxx").await;
        assert_eq!(result.intent, Intent::SqlQuery);
        assert_eq!(result.confidence, 0.1);
        assert_eq!(result.metadata["fallback_reason"], "no example scored above zero");
    }

    #[tokio::test]
    async fn empty_arena_falls_back() {
        let c = SimilarityClassifier::with_examples(
            ClassifierConfig::similarity(),
            None,
            Vec::new(),
        )
        .await;
        let result = c.classify("hello there").await;
        assert_eq!(result.intent, Intent::SqlQuery);
        assert_eq!(result.confidence, 0.1);
    }

    #[tokio::test]
    async fn embedding_path_reports_method() {
        let c = embedded_classifier().await;
        let result = c.classify("hello there").await;
        assert_eq!(result.intent, Intent::Greeting);
        assert_eq!(result.metadata["similarity_method"], "embedding");
        assert!(result.confidence > 0.9);
    }

    #[tokio::test]
    async fn add_example_extends_arena() {
        let c = jaccard_classifier().await;
        let before = c.example_count();
        assert!(c.add_example(Intent::ExportCsv, "ship me a spreadsheet").await);
        assert_eq!(c.example_count(), before + 1);
        let result = c.classify("ship me a spreadsheet").await;
        assert_eq!(result.intent, Intent::ExportCsv);
        assert_eq!(result.confidence, 1.0);
    }

    #[tokio::test]
    async fn remove_example() {
        let c = jaccard_classifier().await;
        assert!(c.remove_example(Intent::Greeting, "hello there"));
        assert!(!c.remove_example(Intent::Greeting, "hello there"));
        assert!(!c.examples_for(Intent::Greeting).contains(&"hello there".to_string()));
    }

    #[tokio::test]
    async fn examples_for_filters_by_intent() {
        let c = jaccard_classifier().await;
        let greetings = c.examples_for(Intent::Greeting);
        assert_eq!(greetings.len(), 4);
        assert!(c.examples_for(Intent::Unknown).is_empty());
    }

    #[tokio::test]
    async fn inflight_snapshot_survives_mutation() {
        let c = Arc::new(jaccard_classifier().await);
        // Grab results concurrently with mutation; no panics, both total.
        let c2 = Arc::clone(&c);
        let classify = tokio::spawn(async move { c2.classify("good morning").await });
        c.remove_example(Intent::Greeting, "good morning");
        let result = classify.await.unwrap();
        assert!((0.0..=1.0).contains(&result.confidence));
    }

    #[tokio::test]
    async fn from_file_skips_bad_intents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("examples.json");
        std::fs::write(
            &path,
            r#"{"greeting": ["hiya"], "not_real": ["whatever"]}"#,
        )
        .unwrap();
        let c =
            SimilarityClassifier::from_file(ClassifierConfig::similarity(), None, &path).await;
        assert_eq!(c.example_count(), 1);
        assert_eq!(c.classify("hiya").await.intent, Intent::Greeting);
    }
}
