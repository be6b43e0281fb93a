// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The query service and its per-intent dispatch.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{info, instrument, warn};

use sequin_conversation::{ConversationStore, ResultCache};
use sequin_core::traits::{Exporter, GenerationBackend};
use sequin_core::{Generation, ResponseData, ResponseEnvelope, ResponseKind, Role, SequinError};
use sequin_intent::{Intent, IntentClassifier, PatternClassifier, SimilarityClassifier};

const GREETING_ANSWER: &str = "Hello, how can I help you?";
const NO_PRIOR_QUERY_ANSWER: &str = "No SQL query was executed for your previous request.";

/// Orchestrates classification, conversation state, and collaborators for
/// one question at a time. Cheap to share; every field is an `Arc`.
pub struct QueryService {
    history: Arc<ConversationStore>,
    results: Arc<ResultCache>,
    pattern: Arc<PatternClassifier>,
    similarity: Arc<SimilarityClassifier>,
    backend: Arc<dyn GenerationBackend>,
    exporter: Arc<dyn Exporter>,
    /// Bound on each backend and exporter call.
    collaborator_timeout: Duration,
}

/// Builder for [`QueryService`]; only the timeout has a default.
pub struct QueryServiceBuilder {
    history: Option<Arc<ConversationStore>>,
    results: Option<Arc<ResultCache>>,
    pattern: Option<Arc<PatternClassifier>>,
    similarity: Option<Arc<SimilarityClassifier>>,
    backend: Option<Arc<dyn GenerationBackend>>,
    exporter: Option<Arc<dyn Exporter>>,
    collaborator_timeout: Duration,
}

impl QueryServiceBuilder {
    pub fn new() -> Self {
        Self {
            history: None,
            results: None,
            pattern: None,
            similarity: None,
            backend: None,
            exporter: None,
            collaborator_timeout: Duration::from_secs(30),
        }
    }

    pub fn history(mut self, history: Arc<ConversationStore>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn results(mut self, results: Arc<ResultCache>) -> Self {
        self.results = Some(results);
        self
    }

    pub fn pattern_classifier(mut self, pattern: Arc<PatternClassifier>) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn similarity_classifier(mut self, similarity: Arc<SimilarityClassifier>) -> Self {
        self.similarity = Some(similarity);
        self
    }

    pub fn backend(mut self, backend: Arc<dyn GenerationBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn exporter(mut self, exporter: Arc<dyn Exporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    pub fn collaborator_timeout(mut self, timeout: Duration) -> Self {
        self.collaborator_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<QueryService, SequinError> {
        let missing = |what: &str| SequinError::Config(format!("query service needs {what}"));
        Ok(QueryService {
            history: self.history.ok_or_else(|| missing("a conversation store"))?,
            results: self.results.ok_or_else(|| missing("a result cache"))?,
            pattern: self.pattern.ok_or_else(|| missing("a pattern classifier"))?,
            similarity: self
                .similarity
                .ok_or_else(|| missing("a similarity classifier"))?,
            backend: self.backend.ok_or_else(|| missing("a generation backend"))?,
            exporter: self.exporter.ok_or_else(|| missing("an exporter"))?,
            collaborator_timeout: self.collaborator_timeout,
        })
    }
}

impl Default for QueryServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one dispatch branch, before it is folded into the envelope
/// and the conversation record.
struct BranchOutcome {
    answer: String,
    success: bool,
    kind: ResponseKind,
    data: ResponseData,
    /// Failure detail recorded as a system turn; user-facing answer stays
    /// separate.
    failure_note: Option<String>,
}

impl BranchOutcome {
    fn success(answer: impl Into<String>, kind: ResponseKind, data: ResponseData) -> Self {
        Self {
            answer: answer.into(),
            success: true,
            kind,
            data,
            failure_note: None,
        }
    }

    fn failure(answer: impl Into<String>, note: impl Into<String>) -> Self {
        let answer = answer.into();
        Self {
            data: ResponseData::Text(answer.clone()),
            answer,
            success: false,
            kind: ResponseKind::Text,
            failure_note: Some(note.into()),
        }
    }
}

impl QueryService {
    pub fn builder() -> QueryServiceBuilder {
        QueryServiceBuilder::new()
    }

    /// Handle one question end to end.
    ///
    /// Never fails: every error path resolves to a failure envelope. The
    /// session id on the envelope is always set, minted here when the
    /// caller supplied none.
    #[instrument(skip_all, fields(session_id))]
    pub async fn run(&self, question: &str, session_id: Option<String>) -> ResponseEnvelope {
        let session_id = match session_id.filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => {
                let id = self.history.create_session().await;
                info!(session_id = %id, "created new session");
                id
            }
        };
        tracing::Span::current().record("session_id", session_id.as_str());

        let intent = self.classify(question).await;
        info!(%intent, "dispatching");

        // Context must predate the current question; capture it before the
        // user turn is recorded.
        let context = self.history.conversation_context(&session_id, None).await;
        self.history
            .add_message(&session_id, Role::User, question, None)
            .await;

        let outcome = match intent {
            Intent::Greeting => BranchOutcome::success(
                GREETING_ANSWER,
                ResponseKind::Text,
                ResponseData::Text(GREETING_ANSWER.to_string()),
            ),
            Intent::SqlQuery => self.run_query(&session_id, question, &context).await,
            Intent::ShowSql => self.show_sql(&session_id).await,
            Intent::ExportCsv => self.export_csv(&session_id).await,
            Intent::Unknown => BranchOutcome::failure(
                "I didn't understand that. Try asking about your app metrics.",
                "unclassifiable input",
            ),
        };

        self.record_outcome(&session_id, &outcome).await;

        let mut envelope = ResponseEnvelope::new(question, session_id);
        envelope.answer = outcome.answer;
        envelope.success = outcome.success;
        envelope.kind = outcome.kind;
        envelope.data = outcome.data;
        envelope
    }

    /// Tier one, falling through to tier two when not confident. The
    /// similarity tier's answer is used confident or not; its own fallback
    /// already applied.
    async fn classify(&self, question: &str) -> Intent {
        let first = self.pattern.classify(question);
        if self.pattern.is_confident(&first) {
            info!(intent = %first.intent, confidence = first.confidence, "pattern tier confident");
            return first.intent;
        }
        let second = IntentClassifier::classify(self.similarity.as_ref(), question).await;
        info!(intent = %second.intent, confidence = second.confidence, "similarity tier used");
        second.intent
    }

    async fn run_query(&self, session_id: &str, question: &str, context: &str) -> BranchOutcome {
        let generation = timeout(
            self.collaborator_timeout,
            self.backend.generate(question, context),
        )
        .await
        .map_err(|_| SequinError::Timeout {
            duration: self.collaborator_timeout,
        })
        .and_then(|inner| inner);

        match generation {
            Ok(Generation { answer, sql, rows }) => {
                // Cache only successful resolutions; failures must not
                // disturb the previous slot.
                self.results.store_result(session_id, &sql, &rows).await;
                if rows.len() > 1 {
                    BranchOutcome::success(answer, ResponseKind::Table, ResponseData::Rows(rows))
                } else {
                    BranchOutcome::success(
                        answer.clone(),
                        ResponseKind::Text,
                        ResponseData::Text(answer),
                    )
                }
            }
            Err(e) => {
                warn!(error = %e, "query generation failed");
                BranchOutcome::failure(
                    format!("Sorry, I couldn't answer that question: {e}"),
                    format!("query generation failed: {e}"),
                )
            }
        }
    }

    async fn show_sql(&self, session_id: &str) -> BranchOutcome {
        match self.results.last_sql(session_id).await {
            Some(sql) => BranchOutcome::success(
                sql.clone(),
                ResponseKind::Sql,
                ResponseData::Text(sql),
            ),
            None => BranchOutcome::failure(NO_PRIOR_QUERY_ANSWER, "show_sql with empty cache"),
        }
    }

    async fn export_csv(&self, session_id: &str) -> BranchOutcome {
        let rows = match self.results.last_rows(session_id).await {
            Some(rows) if !rows.is_empty() => rows,
            _ => {
                return BranchOutcome::failure(
                    NO_PRIOR_QUERY_ANSWER,
                    "export_csv with empty cache",
                );
            }
        };

        let exported = timeout(self.collaborator_timeout, self.exporter.export(&rows))
            .await
            .map_err(|_| SequinError::Timeout {
                duration: self.collaborator_timeout,
            })
            .and_then(|inner| inner);

        match exported {
            Ok(reference) => BranchOutcome::success(
                format!("Your export is ready: {reference}"),
                ResponseKind::Download,
                ResponseData::Text(reference),
            ),
            Err(e) => {
                warn!(error = %e, "export failed");
                BranchOutcome::failure(
                    format!("Sorry, the export failed: {e}"),
                    format!("export failed: {e}"),
                )
            }
        }
    }

    /// Success lands as an assistant turn; failure as a system turn carrying
    /// the diagnostic note.
    async fn record_outcome(&self, session_id: &str, outcome: &BranchOutcome) {
        if outcome.success {
            self.history
                .add_message(session_id, Role::Assistant, &outcome.answer, None)
                .await;
        } else {
            let note = outcome
                .failure_note
                .as_deref()
                .unwrap_or("request failed");
            self.history
                .add_message(session_id, Role::System, note, None)
                .await;
        }
    }
}
