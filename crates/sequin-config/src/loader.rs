// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./sequin.toml` > `~/.config/sequin/sequin.toml` >
//! `/etc/sequin/sequin.toml` with environment variable overrides via the
//! `SEQUIN_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::SequinConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/sequin/sequin.toml` (system-wide)
/// 3. `~/.config/sequin/sequin.toml` (user XDG config)
/// 4. `./sequin.toml` (local directory)
/// 5. `SEQUIN_*` environment variables
pub fn load_config() -> Result<SequinConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SequinConfig::default()))
        .merge(Toml::file("/etc/sequin/sequin.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("sequin/sequin.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("sequin.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from an inline TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<SequinConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SequinConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SequinConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SequinConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `SEQUIN_BACKEND_API_KEY` must map to
/// `backend.api_key`, not `backend.api.key`.
fn env_provider() -> Env {
    Env::prefixed("SEQUIN_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("classifier_", "classifier.", 1)
            .replacen("history_", "history.", 1)
            .replacen("backend_", "backend.", 1)
            .replacen("export_", "export.", 1)
            .replacen("embedding_", "embedding.", 1);
        mapped.into()
    })
}
