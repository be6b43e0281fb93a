// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation state for Sequin sessions.
//!
//! Two collaborators over the shared [`KeyValueStore`]: the bounded
//! per-session message history ([`ConversationStore`]) and the single-slot
//! cache of the last successful query ([`ResultCache`]). Both treat the
//! store as a soft dependency and degrade instead of erroring.
//!
//! [`KeyValueStore`]: sequin_core::traits::KeyValueStore

pub mod history;
pub mod result_cache;

pub use history::{ConversationStore, SessionStats};
pub use result_cache::ResultCache;
