// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session-scoped conversation history over a shared key-value store.
//!
//! History is bounded: each session keeps at most `2 * max_turns` messages
//! (a turn being one user/assistant exchange), truncated oldest-first on
//! every append. The store is a soft dependency: every operation is bounded
//! by a timeout and converts store outages into `false`/`None`/empty
//! returns and logs, so a dead or hung store degrades the conversation
//! instead of killing it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use sequin_core::traits::KeyValueStore;
use sequin_core::{ChatMessage, Role, SequinError};

/// Bound on each individual store operation. A store that stalls past this
/// is treated like an outage.
pub(crate) const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

/// Aggregate bookkeeping for one session.
///
/// `total_messages` counts every message ever recorded; it keeps growing
/// after old messages fall out of the bounded window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub total_messages: u64,
    /// Messages currently inside the bounded window. Computed at read time,
    /// never stored.
    #[serde(default)]
    pub current_message_count: usize,
}

/// Per-session bounded message history.
pub struct ConversationStore {
    store: Arc<dyn KeyValueStore>,
    max_turns: usize,
    history_ttl: Duration,
    store_timeout: Duration,
}

impl ConversationStore {
    pub fn new(store: Arc<dyn KeyValueStore>, max_turns: usize, history_ttl: Duration) -> Self {
        Self {
            store,
            max_turns,
            history_ttl,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Every store call goes through here so a hung store surfaces as an
    /// error on the same soft-degrade paths as an outage.
    async fn bounded<T>(
        &self,
        op: impl Future<Output = Result<T, SequinError>>,
    ) -> Result<T, SequinError> {
        tokio::time::timeout(self.store_timeout, op)
            .await
            .unwrap_or(Err(SequinError::Timeout {
                duration: self.store_timeout,
            }))
    }

    fn history_key(session_id: &str) -> String {
        format!("history:{session_id}")
    }

    fn stats_key(session_id: &str) -> String {
        format!("stats:{session_id}")
    }

    /// Messages retained per session: one turn is a user/assistant pair.
    pub fn max_messages(&self) -> usize {
        self.max_turns * 2
    }

    /// Mint a fresh session id and record its stats entry.
    ///
    /// The session is usable even if the stats write fails.
    pub async fn create_session(&self) -> String {
        let session_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let stats = SessionStats {
            session_id: session_id.clone(),
            created_at: now,
            last_activity: now,
            total_messages: 0,
            current_message_count: 0,
        };
        if !self.write_stats(&stats).await {
            warn!(%session_id, "failed to record stats for new session");
        }
        info!(%session_id, "session created");
        session_id
    }

    /// Append a message to the session's history window, with optional
    /// per-message metadata.
    ///
    /// Read-modify-write without locking: two concurrent appends to the same
    /// session can lose one of the messages. Sessions are conversational
    /// (one message in flight at a time) so this is accepted, not fixed.
    pub async fn add_message(
        &self,
        session_id: &str,
        role: Role,
        content: &str,
        metadata: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> bool {
        let mut messages = self.load_history(session_id).await;
        messages.push(ChatMessage {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
            metadata: metadata.unwrap_or_default(),
        });

        let max = self.max_messages();
        if messages.len() > max {
            let drop = messages.len() - max;
            messages.drain(..drop);
            debug!(session_id, dropped = drop, "history window truncated");
        }

        let value = match serde_json::to_value(&messages) {
            Ok(value) => value,
            Err(e) => {
                warn!(session_id, error = %e, "failed to serialize history");
                return false;
            }
        };
        if let Err(e) = self
            .bounded(self.store.set(
                &Self::history_key(session_id),
                value,
                Some(self.history_ttl),
            ))
            .await
        {
            warn!(session_id, error = %e, "failed to persist history");
            return false;
        }

        self.bump_stats(session_id).await;
        true
    }

    /// The newest messages in the window, oldest first.
    ///
    /// `limit` caps how many of the newest messages are returned. System
    /// messages (recorded failures) are excluded unless asked for.
    pub async fn get_history(
        &self,
        session_id: &str,
        limit: Option<usize>,
        include_system: bool,
    ) -> Vec<ChatMessage> {
        let mut messages = self.load_history(session_id).await;
        if !include_system {
            messages.retain(|m| m.role != Role::System);
        }
        if let Some(limit) = limit {
            if messages.len() > limit {
                messages.drain(..messages.len() - limit);
            }
        }
        messages
    }

    /// The session rendered as prompt context, one `Label: content` line per
    /// non-system message, oldest first.
    pub async fn conversation_context(&self, session_id: &str, limit: Option<usize>) -> String {
        self.get_history(session_id, limit, false)
            .await
            .iter()
            .map(|m| format!("{}: {}", m.role.label(), m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Delete the session's history and stats; `true` only if fully cleared.
    pub async fn clear_history(&self, session_id: &str) -> bool {
        let history = self
            .bounded(self.store.delete(&Self::history_key(session_id)))
            .await;
        let stats = self
            .bounded(self.store.delete(&Self::stats_key(session_id)))
            .await;
        match (history, stats) {
            (Ok(_), Ok(_)) => {
                info!(session_id, "history cleared");
                true
            }
            (history, stats) => {
                for err in [history.err(), stats.err()].into_iter().flatten() {
                    warn!(session_id, error = %err, "failed to clear history");
                }
                false
            }
        }
    }

    /// The session's stats with a live in-window message count, or `None`
    /// for unknown sessions and store outages.
    pub async fn get_session_stats(&self, session_id: &str) -> Option<SessionStats> {
        let value = match self
            .bounded(self.store.get(&Self::stats_key(session_id)))
            .await
        {
            Ok(value) => value?,
            Err(e) => {
                warn!(session_id, error = %e, "failed to read session stats");
                return None;
            }
        };
        let mut stats: SessionStats = match serde_json::from_value(value) {
            Ok(stats) => stats,
            Err(e) => {
                warn!(session_id, error = %e, "malformed session stats");
                return None;
            }
        };
        stats.current_message_count = self.load_history(session_id).await.len();
        Some(stats)
    }

    async fn load_history(&self, session_id: &str) -> Vec<ChatMessage> {
        match self
            .bounded(self.store.get(&Self::history_key(session_id)))
            .await
        {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(messages) => messages,
                Err(e) => {
                    warn!(session_id, error = %e, "malformed history, starting fresh");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(session_id, error = %e, "failed to read history");
                Vec::new()
            }
        }
    }

    async fn write_stats(&self, stats: &SessionStats) -> bool {
        let value = match serde_json::to_value(stats) {
            Ok(value) => value,
            Err(_) => return false,
        };
        self.bounded(self.store.set(
            &Self::stats_key(&stats.session_id),
            value,
            Some(self.history_ttl),
        ))
        .await
        .is_ok()
    }

    /// Best-effort stats update after a successful append. A session whose
    /// stats record is missing (expired, or created before an outage) gets
    /// one re-minted.
    async fn bump_stats(&self, session_id: &str) {
        let now = Utc::now();
        let mut stats = match self.get_session_stats(session_id).await {
            Some(stats) => stats,
            None => SessionStats {
                session_id: session_id.to_string(),
                created_at: now,
                last_activity: now,
                total_messages: 0,
                current_message_count: 0,
            },
        };
        stats.total_messages += 1;
        stats.last_activity = now;
        if !self.write_stats(&stats).await {
            warn!(session_id, "failed to update session stats");
        }
    }
}
