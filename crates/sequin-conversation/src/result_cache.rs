// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-slot cache of the most recent successful query per session.
//!
//! Holds exactly one (SQL, rows) pair per session; every successful query
//! overwrites the previous one. Backs the "show sql" and "export csv"
//! follow-up intents. Same soft-failure contract as the history store.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use sequin_core::traits::KeyValueStore;
use sequin_core::{Row, SequinError};

use crate::history::DEFAULT_STORE_TIMEOUT;

/// Per-session last-result cache.
pub struct ResultCache {
    store: Arc<dyn KeyValueStore>,
    cache_ttl: Duration,
    store_timeout: Duration,
}

impl ResultCache {
    pub fn new(store: Arc<dyn KeyValueStore>, cache_ttl: Duration) -> Self {
        Self {
            store,
            cache_ttl,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Same store-timeout contract as the history store: a hung store is
    /// an outage, never a hang.
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

    fn sql_key(session_id: &str) -> String {
        format!("result:{session_id}:sql")
    }

    fn rows_key(session_id: &str) -> String {
        format!("result:{session_id}:rows")
    }

    /// Overwrite the session's slot with a fresh successful result.
    ///
    /// Only fully written slots report `true`; a partial write (sql landed,
    /// rows did not) reports `false` and is logged.
    pub async fn store_result(&self, session_id: &str, sql: &str, rows: &[Row]) -> bool {
        let rows_value = match serde_json::to_value(rows) {
            Ok(value) => value,
            Err(e) => {
                warn!(session_id, error = %e, "failed to serialize result rows");
                return false;
            }
        };
        let sql_write = self
            .bounded(self.store.set(
                &Self::sql_key(session_id),
                serde_json::Value::String(sql.to_string()),
                Some(self.cache_ttl),
            ))
            .await;
        let rows_write = self
            .bounded(self.store.set(
                &Self::rows_key(session_id),
                rows_value,
                Some(self.cache_ttl),
            ))
            .await;
        match (sql_write, rows_write) {
            (Ok(()), Ok(())) => {
                debug!(session_id, rows = rows.len(), "result cached");
                true
            }
            (sql_write, rows_write) => {
                for err in [sql_write.err(), rows_write.err()].into_iter().flatten() {
                    warn!(session_id, error = %err, "failed to cache result");
                }
                false
            }
        }
    }

    /// The SQL behind the session's previous successful query, if any.
    pub async fn last_sql(&self, session_id: &str) -> Option<String> {
        match self.bounded(self.store.get(&Self::sql_key(session_id))).await {
            Ok(Some(serde_json::Value::String(sql))) => Some(sql),
            Ok(Some(other)) => {
                warn!(session_id, ?other, "malformed cached sql");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(session_id, error = %e, "failed to read cached sql");
                None
            }
        }
    }

    /// The rows from the session's previous successful query, if any.
    pub async fn last_rows(&self, session_id: &str) -> Option<Vec<Row>> {
        let value = match self
            .bounded(self.store.get(&Self::rows_key(session_id)))
            .await
        {
            Ok(value) => value?,
            Err(e) => {
                warn!(session_id, error = %e, "failed to read cached rows");
                return None;
            }
        };
        match serde_json::from_value(value) {
            Ok(rows) => Some(rows),
            Err(e) => {
                warn!(session_id, error = %e, "malformed cached rows");
                None
            }
        }
    }

    /// Drop the session's slot entirely.
    pub async fn clear(&self, session_id: &str) -> bool {
        let sql = self
            .bounded(self.store.delete(&Self::sql_key(session_id)))
            .await;
        let rows = self
            .bounded(self.store.delete(&Self::rows_key(session_id)))
            .await;
        match (sql, rows) {
            (Ok(_), Ok(_)) => true,
            (sql, rows) => {
                for err in [sql.err(), rows.err()].into_iter().flatten() {
                    warn!(session_id, error = %err, "failed to clear cached result");
                }
                false
            }
        }
    }
}
