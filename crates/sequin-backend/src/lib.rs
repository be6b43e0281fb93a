// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible generation backend for Sequin.
//!
//! [`OpenAiClient`] handles the HTTP conversation (auth, retry on transient
//! errors); [`NlToSqlBackend`] layers the analytics prompt and structured
//! reply parsing on top of it, implementing
//! [`sequin_core::traits::GenerationBackend`].

pub mod backend;
pub mod client;
pub mod types;

pub use backend::NlToSqlBackend;
pub use client::OpenAiClient;
