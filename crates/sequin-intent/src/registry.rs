// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared classifier instances keyed by configuration.
//!
//! Classifiers are cheap to call but expensive to build (regex compilation,
//! example embedding), so callers share one instance per distinct
//! configuration. The registry is an injected collaborator, not a process
//! global: separate registries are fully isolated, which keeps tests and
//! multi-tenant embedders honest.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use sequin_core::traits::EmbeddingBackend;

use crate::pattern::PatternClassifier;
use crate::similarity::SimilarityClassifier;
use crate::types::{ClassifierConfig, Intent};

/// Caching factory for classifier instances.
pub struct ClassifierRegistry {
    embedder: Option<Arc<dyn EmbeddingBackend>>,
    patterns: Mutex<HashMap<String, Arc<PatternClassifier>>>,
    similarities: Mutex<HashMap<String, Arc<SimilarityClassifier>>>,
}

impl ClassifierRegistry {
    /// Create a registry. The embedder, when present, is shared by every
    /// similarity classifier this registry builds.
    pub fn new(embedder: Option<Arc<dyn EmbeddingBackend>>) -> Self {
        Self {
            embedder,
            patterns: Mutex::new(HashMap::new()),
            similarities: Mutex::new(HashMap::new()),
        }
    }

    /// Shared pattern classifier for the given threshold (default 0.8).
    ///
    /// Repeat calls with the same threshold return the same instance, so
    /// runtime pattern edits are visible to every holder.
    pub async fn pattern(&self, threshold: Option<f32>) -> Arc<PatternClassifier> {
        let mut config = ClassifierConfig::pattern();
        if let Some(t) = threshold {
            config.confidence_threshold = t;
        }
        let key = format!("pattern:{}", config.confidence_threshold);

        let mut cache = self.patterns.lock().await;
        if let Some(existing) = cache.get(&key) {
            return Arc::clone(existing);
        }
        debug!(%key, "building pattern classifier");
        let classifier = Arc::new(PatternClassifier::new(config));
        cache.insert(key, Arc::clone(&classifier));
        classifier
    }

    /// Shared similarity classifier for the given threshold and fallback
    /// intent (defaults 0.6 and `sql_query`).
    pub async fn similarity(
        &self,
        threshold: Option<f32>,
        fallback: Option<Intent>,
    ) -> Arc<SimilarityClassifier> {
        let mut config = ClassifierConfig::similarity();
        if let Some(t) = threshold {
            config.confidence_threshold = t;
        }
        if let Some(intent) = fallback {
            config.fallback_intent = intent;
        }
        let key = format!(
            "similarity:{}:{}",
            config.confidence_threshold, config.fallback_intent
        );

        let mut cache = self.similarities.lock().await;
        if let Some(existing) = cache.get(&key) {
            return Arc::clone(existing);
        }
        debug!(%key, "building similarity classifier");
        let classifier =
            Arc::new(SimilarityClassifier::new(config, self.embedder.clone()).await);
        cache.insert(key, Arc::clone(&classifier));
        classifier
    }

    /// Number of live cached instances across both tiers.
    pub async fn instance_count(&self) -> usize {
        self.patterns.lock().await.len() + self.similarities.lock().await.len()
    }

    /// Drop every cached instance. Holders of existing `Arc`s keep them;
    /// the next request builds fresh.
    pub async fn clear(&self) {
        self.patterns.lock().await.clear();
        self.similarities.lock().await.clear();
    }
}

impl Default for ClassifierRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_config_shares_instance() {
        let registry = ClassifierRegistry::default();
        let a = registry.pattern(None).await;
        let b = registry.pattern(Some(0.8)).await;
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.instance_count().await, 1);
    }

    #[tokio::test]
    async fn distinct_thresholds_get_distinct_instances() {
        let registry = ClassifierRegistry::default();
        let a = registry.pattern(Some(0.8)).await;
        let b = registry.pattern(Some(0.9)).await;
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.instance_count().await, 2);
    }

    #[tokio::test]
    async fn similarity_keyed_by_threshold_and_fallback() {
        let registry = ClassifierRegistry::default();
        let a = registry.similarity(None, None).await;
        let b = registry.similarity(Some(0.6), Some(Intent::SqlQuery)).await;
        let c = registry.similarity(Some(0.6), Some(Intent::Unknown)).await;
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[tokio::test]
    async fn separate_registries_are_isolated() {
        let left = ClassifierRegistry::default();
        let right = ClassifierRegistry::default();
        let a = left.pattern(None).await;
        let b = right.pattern(None).await;
        assert!(!Arc::ptr_eq(&a, &b));

        // A runtime edit through one registry never leaks into the other.
        a.remove_pattern(Intent::Greeting);
        assert_eq!(b.classify("hello").intent, Intent::Greeting);
    }

    #[tokio::test]
    async fn shared_instance_sees_runtime_edits() {
        let registry = ClassifierRegistry::default();
        let a = registry.pattern(None).await;
        let b = registry.pattern(None).await;
        a.add_pattern(Intent::Greeting, r"^ahoy$");
        assert_eq!(b.classify("ahoy").intent, Intent::Greeting);
    }

    #[tokio::test]
    async fn clear_resets_cache() {
        let registry = ClassifierRegistry::default();
        let before = registry.pattern(None).await;
        registry.clear().await;
        assert_eq!(registry.instance_count().await, 0);
        let after = registry.pattern(None).await;
        assert!(!Arc::ptr_eq(&before, &after));
    }
}
