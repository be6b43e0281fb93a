// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatch orchestrator: one question in, one [`ResponseEnvelope`] out.
//!
//! Stateless per call; all state lives in the conversation store and the
//! result cache. [`QueryService::run`] never returns an error: backend
//! failures, timeouts, and store outages all resolve to a failure envelope,
//! recorded in the session as a system turn.

pub mod service;

pub use service::{QueryService, QueryServiceBuilder};

pub use sequin_core::ResponseEnvelope;
