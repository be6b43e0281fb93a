// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock generation backend for deterministic testing.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use sequin_core::traits::GenerationBackend;
use sequin_core::{Generation, SequinError};

enum Scripted {
    Reply(Generation),
    Failure(String),
    Stall(Duration),
}

/// A generation backend that replays scripted outcomes.
///
/// Outcomes are popped from a FIFO queue. When the queue is empty a default
/// canned generation is returned. Every call is recorded for assertions on
/// what the service actually sent.
pub struct MockGenerationBackend {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockGenerationBackend {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a successful generation.
    pub async fn push_reply(&self, generation: Generation) {
        self.script.lock().await.push_back(Scripted::Reply(generation));
    }

    /// Queue a backend failure with the given message.
    pub async fn push_failure(&self, message: &str) {
        self.script
            .lock()
            .await
            .push_back(Scripted::Failure(message.to_string()));
    }

    /// Queue a call that sleeps for `duration` before answering, for
    /// exercising caller-side timeouts.
    pub async fn push_stall(&self, duration: Duration) {
        self.script.lock().await.push_back(Scripted::Stall(duration));
    }

    /// Every `(question, context)` pair this backend has received, in order.
    pub async fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().await.clone()
    }

    /// A plausible canned generation for tests that only need success.
    pub fn canned() -> Generation {
        let mut row = serde_json::Map::new();
        row.insert("app_name".into(), "Weather Now".into());
        row.insert("installs".into(), serde_json::json!(1200));
        Generation {
            answer: "Weather Now had 1200 installs.".to_string(),
            sql: "SELECT app_name, installs FROM app_metrics LIMIT 1".to_string(),
            rows: vec![row],
        }
    }
}

impl Default for MockGenerationBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn generate(
        &self,
        question: &str,
        context: &str,
    ) -> Result<Generation, SequinError> {
        self.calls
            .lock()
            .await
            .push((question.to_string(), context.to_string()));
        match self.script.lock().await.pop_front() {
            Some(Scripted::Reply(generation)) => Ok(generation),
            Some(Scripted::Failure(message)) => Err(SequinError::Backend {
                message,
                source: None,
            }),
            Some(Scripted::Stall(duration)) => {
                tokio::time::sleep(duration).await;
                Ok(Self::canned())
            }
            None => Ok(Self::canned()),
        }
    }
}
