// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage backends for Sequin.
//!
//! Everything above this crate talks to [`sequin_core::traits::KeyValueStore`];
//! this crate provides the concrete backends. Currently that is the in-memory
//! [`MemoryStore`].

pub mod memory;

pub use memory::MemoryStore;
