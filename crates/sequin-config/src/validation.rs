// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation of configuration values.

use sequin_core::SequinError;

use crate::model::SequinConfig;

/// Validate value ranges Figment cannot express.
///
/// Collects every violation before failing so a bad config file is fixed in
/// one pass.
pub fn validate_config(config: &SequinConfig) -> Result<(), SequinError> {
    let mut problems = Vec::new();

    if !(0.0..=1.0).contains(&config.classifier.pattern_threshold) {
        problems.push(format!(
            "classifier.pattern_threshold must be within [0, 1], got {}",
            config.classifier.pattern_threshold
        ));
    }
    if !(0.0..=1.0).contains(&config.classifier.similarity_threshold) {
        problems.push(format!(
            "classifier.similarity_threshold must be within [0, 1], got {}",
            config.classifier.similarity_threshold
        ));
    }
    if config.history.max_turns == 0 {
        problems.push("history.max_turns must be at least 1".to_string());
    }
    if config.history.history_ttl_secs == 0 {
        problems.push("history.history_ttl_secs must be nonzero".to_string());
    }
    if config.backend.timeout_secs == 0 {
        problems.push("backend.timeout_secs must be nonzero".to_string());
    }
    if config.export.max_files == 0 {
        problems.push("export.max_files must be at least 1".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(SequinError::Config(problems.join("; ")))
    }
}
