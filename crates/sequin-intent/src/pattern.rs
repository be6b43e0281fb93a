// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pattern-based intent classification.
//!
//! Fast, deterministic first tier: curated per-intent regexes searched
//! case-insensitively over the normalized input. Confidence scales with how
//! much of the input the match covers; a match spanning the whole input is
//! treated as near-certain.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::RwLock;

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use tracing::{debug, error, info, warn};

use crate::types::{ClassifierConfig, Intent, IntentClassifier, IntentResult};

/// A raw pattern and its compiled form, kept in sync as one unit.
struct PatternEntry {
    intent: Intent,
    raw: String,
    regex: Regex,
}

/// Built-in per-intent patterns, in priority order (ties keep the first).
///
/// `sql_query` deliberately has no pattern: free-form questions fall through
/// to the low-confidence fallback and on to the similarity tier.
fn default_patterns() -> Vec<(Intent, &'static str)> {
    vec![
        (
            Intent::Greeting,
            r"^\s*(hi|hello|hey|howdy|greetings|good\s+(morning|afternoon|evening)|what's\s+up|yo)[\s!.,]*$",
        ),
        (
            Intent::ShowSql,
            r"\b(show|display|view|see|print|what)\b.*\b(sql|query)\b",
        ),
        (
            Intent::ExportCsv,
            r"\b(export|download|save|dump)\b.*\b(csv|file|data|results?|table|rows)\b",
        ),
    ]
}

/// Regex-driven intent classifier. Pure function of the input and the
/// loaded patterns; cheap enough to run on every message.
pub struct PatternClassifier {
    config: ClassifierConfig,
    entries: RwLock<Vec<PatternEntry>>,
}

impl PatternClassifier {
    /// Create a classifier with the built-in pattern table.
    pub fn new(config: ClassifierConfig) -> Self {
        let pairs = default_patterns()
            .into_iter()
            .map(|(intent, raw)| (intent, raw.to_string()))
            .collect();
        Self::with_patterns(config, pairs)
    }

    /// Create a classifier from explicit (intent, pattern) pairs.
    ///
    /// Invalid patterns are rejected and logged, not installed; the
    /// classifier stays usable with the remainder.
    pub fn with_patterns(config: ClassifierConfig, pairs: Vec<(Intent, String)>) -> Self {
        let mut entries = Vec::with_capacity(pairs.len());
        for (intent, raw) in pairs {
            match compile(&raw) {
                Ok(regex) => entries.push(PatternEntry { intent, raw, regex }),
                Err(e) => error!(%intent, error = %e, "invalid pattern skipped"),
            }
        }
        info!(patterns = entries.len(), "pattern classifier initialized");
        Self {
            config,
            entries: RwLock::new(entries),
        }
    }

    /// Create a classifier from a JSON file of intent name -> pattern.
    ///
    /// Unreadable files and unknown intent names are logged and skipped; the
    /// classifier is still usable (possibly with no patterns at all).
    pub fn from_file(config: ClassifierConfig, path: &Path) -> Self {
        let raw_map: HashMap<String, String> = match std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|s| serde_json::from_str(&s).map_err(|e| e.to_string()))
        {
            Ok(map) => map,
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to load patterns file");
                HashMap::new()
            }
        };

        let mut pairs = Vec::with_capacity(raw_map.len());
        for (name, pattern) in raw_map {
            match Intent::from_str(&name) {
                Ok(intent) => pairs.push((intent, pattern)),
                Err(_) => warn!(intent = %name, "pattern exists for unsupported intent"),
            }
        }
        Self::with_patterns(config, pairs)
    }

    /// Classify the input against every loaded pattern.
    ///
    /// The highest-confidence match wins; ties keep the first encountered.
    /// With no match at all the result falls back to `sql_query` at 0.1 so
    /// free-form questions reach the similarity tier.
    pub fn classify(&self, text: &str) -> IntentResult {
        let normalized = text.trim().to_lowercase();
        let text_len = normalized.chars().count();

        let mut best: Option<(Intent, f32, String, String)> = None;

        if text_len > 0 {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            for entry in entries.iter() {
                let Some(m) = entry.regex.find(&normalized) else {
                    continue;
                };
                let match_len = m.as_str().chars().count();
                let mut confidence = ((match_len as f32 / text_len as f32) * 1.2).min(0.9);
                if m.as_str().trim() == normalized {
                    confidence = 0.95;
                }
                if best.as_ref().is_none_or(|(_, c, _, _)| confidence > *c) {
                    best = Some((
                        entry.intent,
                        confidence,
                        entry.raw.clone(),
                        m.as_str().to_string(),
                    ));
                }
            }
        }

        match best {
            Some((intent, confidence, pattern, matched)) => {
                debug!(%intent, confidence, "pattern match");
                let mut metadata = serde_json::Map::new();
                metadata.insert("classifier".into(), "pattern".into());
                metadata.insert("matched_pattern".into(), pattern.into());
                metadata.insert("matched_text".into(), matched.into());
                IntentResult {
                    intent,
                    confidence,
                    metadata,
                }
            }
            None => {
                let mut metadata = serde_json::Map::new();
                metadata.insert("classifier".into(), "pattern".into());
                metadata.insert("fallback_reason".into(), "no pattern matched".into());
                IntentResult {
                    intent: Intent::SqlQuery,
                    confidence: 0.1,
                    metadata,
                }
            }
        }
    }

    /// Install or replace the pattern for an intent.
    ///
    /// An invalid pattern is rejected and logged; the previous pattern (if
    /// any) stays in place.
    pub fn add_pattern(&self, intent: Intent, pattern: &str) -> bool {
        let regex = match compile(pattern) {
            Ok(r) => r,
            Err(e) => {
                error!(%intent, error = %e, "invalid pattern rejected");
                return false;
            }
        };
        let entry = PatternEntry {
            intent,
            raw: pattern.to_string(),
            regex,
        };
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        match entries.iter_mut().find(|e| e.intent == intent) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        info!(%intent, "pattern installed");
        true
    }

    /// Remove the pattern for an intent; returns whether one existed.
    pub fn remove_pattern(&self, intent: Intent) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|e| e.intent != intent);
        let removed = entries.len() < before;
        if removed {
            info!(%intent, "pattern removed");
        }
        removed
    }

    /// The raw pattern installed for an intent, if any.
    pub fn pattern_for(&self, intent: Intent) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .find(|e| e.intent == intent)
            .map(|e| e.raw.clone())
    }

    /// Intents that currently have a pattern installed.
    pub fn supported_intents(&self) -> Vec<Intent> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.iter().map(|e| e.intent).collect()
    }
}

#[async_trait]
impl IntentClassifier for PatternClassifier {
    async fn classify(&self, text: &str) -> IntentResult {
        PatternClassifier::classify(self, text)
    }

    fn config(&self) -> &ClassifierConfig {
        &self.config
    }
}

fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn classifier() -> PatternClassifier {
        PatternClassifier::new(ClassifierConfig::pattern())
    }

    #[test]
    fn whole_input_match_is_near_certain() {
        let c = classifier();
        let result = c.classify("hello");
        assert_eq!(result.intent, Intent::Greeting);
        assert_eq!(result.confidence, 0.95);
        assert!(c.is_confident(&result));
    }

    #[test]
    fn greeting_case_insensitive() {
        let c = classifier();
        assert_eq!(c.classify("  HeLLo!  ").intent, Intent::Greeting);
        assert_eq!(c.classify("Good Morning").intent, Intent::Greeting);
    }

    #[test]
    fn show_sql_detected() {
        let c = classifier();
        let result = c.classify("show me the sql");
        assert_eq!(result.intent, Intent::ShowSql);
        // The match spans the entire input.
        assert_eq!(result.confidence, 0.95);
    }

    #[test]
    fn export_csv_detected() {
        let c = classifier();
        let result = c.classify("export the results as csv");
        assert_eq!(result.intent, Intent::ExportCsv);
        assert!(result.confidence > 0.5);
    }

    #[test]
    fn partial_match_has_lower_confidence() {
        let c = classifier();
        let result = c.classify(
            "before you answer anything else today could you please show me the sql you ran",
        );
        assert_eq!(result.intent, Intent::ShowSql);
        assert!(result.confidence < 0.95);
    }

    #[test]
    fn free_form_question_falls_back_to_sql_query() {
        let c = classifier();
        let result = c.classify("what are the top performing apps by installs?");
        assert_eq!(result.intent, Intent::SqlQuery);
        assert_eq!(result.confidence, 0.1);
        assert!(!c.is_confident(&result));
        assert_eq!(result.metadata["fallback_reason"], "no pattern matched");
    }

    #[test]
    fn empty_input_falls_back() {
        let c = classifier();
        let result = c.classify("   ");
        assert_eq!(result.intent, Intent::SqlQuery);
        assert_eq!(result.confidence, 0.1);
    }

    #[test]
    fn tie_keeps_first_encountered() {
        let c = classifier();
        // Same pattern as the built-in greeting, installed later for unknown.
        assert!(c.add_pattern(
            Intent::Unknown,
            r"^\s*(hi|hello|hey|howdy|greetings|good\s+(morning|afternoon|evening)|what's\s+up|yo)[\s!.,]*$",
        ));
        let result = c.classify("hello");
        assert_eq!(result.intent, Intent::Greeting);
    }

    #[test]
    fn add_pattern_replaces_existing() {
        let c = classifier();
        assert!(c.add_pattern(Intent::Greeting, r"^salutations$"));
        assert_eq!(c.classify("salutations").intent, Intent::Greeting);
        assert_eq!(c.classify("hello").intent, Intent::SqlQuery);
        assert_eq!(
            c.pattern_for(Intent::Greeting).as_deref(),
            Some(r"^salutations$")
        );
    }

    #[test]
    fn invalid_pattern_rejected_and_old_kept() {
        let c = classifier();
        assert!(!c.add_pattern(Intent::Greeting, r"([unclosed"));
        // Original pattern still installed.
        assert_eq!(c.classify("hello").intent, Intent::Greeting);
    }

    #[test]
    fn remove_pattern() {
        let c = classifier();
        assert!(c.remove_pattern(Intent::Greeting));
        assert!(!c.remove_pattern(Intent::Greeting));
        assert_eq!(c.classify("hello").intent, Intent::SqlQuery);
    }

    #[test]
    fn supported_intents_tracks_mutations() {
        let c = classifier();
        assert_eq!(c.supported_intents().len(), 3);
        c.remove_pattern(Intent::ExportCsv);
        assert_eq!(c.supported_intents().len(), 2);
    }

    #[test]
    fn from_file_skips_bad_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patterns.json");
        std::fs::write(
            &path,
            r#"{"greeting": "^hi$", "not_an_intent": "^x$", "show_sql": "([bad"}"#,
        )
        .unwrap();
        let c = PatternClassifier::from_file(ClassifierConfig::pattern(), &path);
        // Only the valid greeting pattern survives.
        assert_eq!(c.supported_intents(), vec![Intent::Greeting]);
        assert_eq!(c.classify("hi").intent, Intent::Greeting);
    }

    #[test]
    fn from_missing_file_is_usable_with_no_patterns() {
        let c = PatternClassifier::from_file(
            ClassifierConfig::pattern(),
            Path::new("/nonexistent/patterns.json"),
        );
        assert!(c.supported_intents().is_empty());
        assert_eq!(c.classify("hello").intent, Intent::SqlQuery);
    }

    proptest! {
        #[test]
        fn classify_is_total_and_bounded(input in ".{0,200}") {
            let c = classifier();
            let result = c.classify(&input);
            prop_assert!((0.0..=1.0).contains(&result.confidence));
            prop_assert!(matches!(
                result.intent,
                Intent::Greeting
                    | Intent::SqlQuery
                    | Intent::ShowSql
                    | Intent::ExportCsv
                    | Intent::Unknown
            ));
        }
    }
}
