// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Sequin.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Sequin configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SequinConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Intent classifier thresholds and curated data files.
    #[serde(default)]
    pub classifier: ClassifierSettings,

    /// Conversation history and result cache settings.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Generation backend (OpenAI-compatible chat completions) settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// CSV export settings.
    #[serde(default)]
    pub export: ExportConfig,

    /// Local embedding model settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the assistant.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "sequin".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Intent classifier configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierSettings {
    /// Confidence threshold for the pattern classifier. Below it the
    /// orchestrator falls through to the similarity classifier.
    #[serde(default = "default_pattern_threshold")]
    pub pattern_threshold: f32,

    /// Confidence threshold for the similarity classifier.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Optional JSON file of intent name -> regex pattern, replacing the
    /// built-in pattern table.
    #[serde(default)]
    pub patterns_file: Option<String>,

    /// Optional JSON file of intent name -> example utterances, replacing
    /// the built-in example table.
    #[serde(default)]
    pub examples_file: Option<String>,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            pattern_threshold: default_pattern_threshold(),
            similarity_threshold: default_similarity_threshold(),
            patterns_file: None,
            examples_file: None,
        }
    }
}

fn default_pattern_threshold() -> f32 {
    0.8
}

fn default_similarity_threshold() -> f32 {
    0.6
}

/// Conversation history and result cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryConfig {
    /// Maximum conversation turns kept per session; the stored window is
    /// twice this (a user and an assistant entry per turn).
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// Inactivity TTL for history and stats records, in seconds.
    #[serde(default = "default_history_ttl_secs")]
    pub history_ttl_secs: u64,

    /// Default TTL for other store entries (result cache), in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            history_ttl_secs: default_history_ttl_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_max_turns() -> usize {
    5
}

fn default_history_ttl_secs() -> u64 {
    86_400
}

fn default_cache_ttl_secs() -> u64 {
    3_600
}

/// Generation backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Chat-completions endpoint URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier sent with each request.
    #[serde(default = "default_model")]
    pub model: String,

    /// API key. `None` requires the `SEQUIN_BACKEND_API_KEY` env override.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-call deadline in seconds; the orchestrator resolves a timeout to
    /// a failure response.
    #[serde(default = "default_backend_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            timeout_secs: default_backend_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_backend_timeout_secs() -> u64 {
    30
}

/// CSV export configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    /// Directory export files are written to (created on demand).
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Number of most recent export files kept by rotation.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_files: default_max_files(),
        }
    }
}

fn default_output_dir() -> String {
    "exports".to_string()
}

fn default_max_files() -> usize {
    10
}

/// Local embedding model configuration.
///
/// When `model_path` is unset (or the `onnx` feature is disabled) the
/// similarity classifier runs on its Jaccard fallback.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// Path to an ONNX sentence-embedding model (`tokenizer.json` expected
    /// alongside it).
    #[serde(default)]
    pub model_path: Option<String>,
}
