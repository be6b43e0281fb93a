// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring: configuration in, a ready [`QueryService`] and its state out.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use sequin_backend::{NlToSqlBackend, OpenAiClient};
use sequin_config::SequinConfig;
use sequin_conversation::{ConversationStore, ResultCache};
use sequin_core::traits::{EmbeddingBackend, Exporter, GenerationBackend, KeyValueStore};
use sequin_core::SequinError;
use sequin_export::CsvExporter;
use sequin_intent::{
    ClassifierConfig, ClassifierRegistry, PatternClassifier, SimilarityClassifier,
};
use sequin_service::QueryService;
use sequin_storage::MemoryStore;

/// The assembled service plus the state handles the shell needs directly.
pub struct App {
    pub service: QueryService,
    pub history: Arc<ConversationStore>,
    pub results: Arc<ResultCache>,
}

impl App {
    pub async fn build(config: &SequinConfig) -> Result<Self, SequinError> {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let history = Arc::new(ConversationStore::new(
            Arc::clone(&store),
            config.history.max_turns,
            Duration::from_secs(config.history.history_ttl_secs),
        ));
        let results = Arc::new(ResultCache::new(
            store,
            Duration::from_secs(config.history.cache_ttl_secs),
        ));

        let embedder = load_embedder(config);
        let registry = ClassifierRegistry::new(embedder.clone());

        let mut pattern_config = ClassifierConfig::pattern();
        pattern_config.confidence_threshold = config.classifier.pattern_threshold;
        let pattern = match &config.classifier.patterns_file {
            Some(path) => Arc::new(PatternClassifier::from_file(
                pattern_config,
                Path::new(path),
            )),
            None => {
                registry
                    .pattern(Some(config.classifier.pattern_threshold))
                    .await
            }
        };

        let mut similarity_config = ClassifierConfig::similarity();
        similarity_config.confidence_threshold = config.classifier.similarity_threshold;
        let similarity = match &config.classifier.examples_file {
            Some(path) => Arc::new(
                SimilarityClassifier::from_file(
                    similarity_config,
                    embedder.clone(),
                    Path::new(path),
                )
                .await,
            ),
            None => {
                registry
                    .similarity(Some(config.classifier.similarity_threshold), None)
                    .await
            }
        };

        let api_key = config
            .backend
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                SequinError::Config(
                    "backend api key missing; set backend.api_key, SEQUIN_BACKEND_API_KEY, \
                     or OPENAI_API_KEY"
                        .to_string(),
                )
            })?;
        let client = OpenAiClient::new(
            &api_key,
            config.backend.base_url.clone(),
            config.backend.model.clone(),
            Duration::from_secs(config.backend.timeout_secs),
        )?;
        let backend: Arc<dyn GenerationBackend> = Arc::new(NlToSqlBackend::new(client));

        let exporter: Arc<dyn Exporter> = Arc::new(CsvExporter::new(
            &config.export.output_dir,
            config.export.max_files,
        ));

        let service = QueryService::builder()
            .history(Arc::clone(&history))
            .results(Arc::clone(&results))
            .pattern_classifier(pattern)
            .similarity_classifier(similarity)
            .backend(backend)
            .exporter(exporter)
            .collaborator_timeout(Duration::from_secs(config.backend.timeout_secs))
            .build()?;

        Ok(Self {
            service,
            history,
            results,
        })
    }
}

#[cfg(feature = "onnx")]
fn load_embedder(config: &SequinConfig) -> Option<Arc<dyn EmbeddingBackend>> {
    let path = config.embedding.model_path.as_deref()?;
    match sequin_intent::OnnxEmbedder::new(Path::new(path)) {
        Ok(embedder) => {
            info!(model = path, "local embedding model loaded");
            Some(Arc::new(embedder))
        }
        Err(e) => {
            tracing::warn!(model = path, error = %e, "failed to load embedding model, using token overlap");
            None
        }
    }
}

#[cfg(not(feature = "onnx"))]
fn load_embedder(config: &SequinConfig) -> Option<Arc<dyn EmbeddingBackend>> {
    if config.embedding.model_path.is_some() {
        info!("embedding.model_path set but the onnx feature is disabled, using token overlap");
    }
    None
}
