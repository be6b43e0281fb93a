// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent taxonomy and classification result types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// What a message asks the assistant to do.
///
/// Closed set: every classification produces exactly one of these; there is
/// no "no intent" state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Small talk opener.
    Greeting,
    /// Run a fresh natural-language query against the metrics data.
    SqlQuery,
    /// Replay the query generated for the previous question.
    ShowSql,
    /// Export the previous result set.
    ExportCsv,
    /// Nothing recognizable.
    Unknown,
}

/// Result of classifying one message. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentResult {
    pub intent: Intent,
    /// Classifier-reported certainty in [0, 1].
    pub confidence: f32,
    /// Open diagnostics map: method used, matched pattern/example, raw scores.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Fixed-at-construction classifier configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierConfig {
    /// Minimum confidence at which this classifier's output is trusted
    /// without falling back.
    pub confidence_threshold: f32,
    /// Intent reported when the classifier has nothing to go on.
    pub fallback_intent: Intent,
}

impl ClassifierConfig {
    /// Defaults for the pattern classifier.
    pub fn pattern() -> Self {
        Self {
            confidence_threshold: 0.8,
            fallback_intent: Intent::Unknown,
        }
    }

    /// Defaults for the similarity classifier.
    pub fn similarity() -> Self {
        Self {
            confidence_threshold: 0.6,
            fallback_intent: Intent::SqlQuery,
        }
    }
}

/// Capability interface shared by the two classifier strategies.
///
/// `classify` always returns its best guess; threshold gating is the
/// caller's responsibility via [`is_confident`](IntentClassifier::is_confident).
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> IntentResult;

    fn config(&self) -> &ClassifierConfig;

    /// Whether a result meets this classifier's confidence threshold.
    fn is_confident(&self, result: &IntentResult) -> bool {
        result.confidence >= self.config().confidence_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn intent_display_round_trips() {
        for intent in [
            Intent::Greeting,
            Intent::SqlQuery,
            Intent::ShowSql,
            Intent::ExportCsv,
            Intent::Unknown,
        ] {
            let s = intent.to_string();
            assert_eq!(Intent::from_str(&s).unwrap(), intent);
        }
    }

    #[test]
    fn intent_snake_case_names() {
        assert_eq!(Intent::SqlQuery.to_string(), "sql_query");
        assert_eq!(Intent::ExportCsv.to_string(), "export_csv");
        assert_eq!(
            serde_json::to_string(&Intent::ShowSql).unwrap(),
            "\"show_sql\""
        );
    }

    #[test]
    fn default_configs() {
        let pattern = ClassifierConfig::pattern();
        assert_eq!(pattern.confidence_threshold, 0.8);
        assert_eq!(pattern.fallback_intent, Intent::Unknown);

        let similarity = ClassifierConfig::similarity();
        assert_eq!(similarity.confidence_threshold, 0.6);
        assert_eq!(similarity.fallback_intent, Intent::SqlQuery);
    }
}
