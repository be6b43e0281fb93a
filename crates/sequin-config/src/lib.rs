// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for Sequin.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, and environment
//! variable overrides.
//!
//! # Usage
//!
//! ```no_run
//! let config = sequin_config::load_and_validate().expect("config errors");
//! println!("agent name: {}", config.agent.name);
//! ```

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::SequinConfig;

use sequin_core::SequinError;

/// Load configuration from the XDG hierarchy and validate it.
pub fn load_and_validate() -> Result<SequinConfig, SequinError> {
    let config = loader::load_config().map_err(|e| SequinError::Config(e.to_string()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

/// Load configuration from an inline TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<SequinConfig, SequinError> {
    let config = loader::load_config_from_str(toml_content)
        .map_err(|e| SequinError::Config(e.to_string()))?;
    validation::validate_config(&config)?;
    Ok(config)
}
