// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across the Sequin workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A single result row: column name to JSON value.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Who authored a conversation turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// Capitalized label used when formatting conversation context.
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
            Role::System => "System",
        }
    }
}

/// A message within a session's bounded history window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// The generation backend's structured outcome for one question.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    /// Human-readable interpretation of the query results.
    pub answer: String,
    /// The SQL query the backend executed.
    pub sql: String,
    /// Result rows from the single underlying data query.
    pub rows: Vec<Row>,
}

/// How a transport should render the response payload.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    #[default]
    Text,
    Table,
    Sql,
    Download,
}

/// Payload of a [`ResponseEnvelope`]; its shape must match the envelope kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
    Text(String),
    Rows(Vec<Row>),
}

impl Default for ResponseData {
    fn default() -> Self {
        ResponseData::Text(String::new())
    }
}

/// Transport-agnostic typed response produced by the dispatch orchestrator.
///
/// Exactly one `type` is set per response; `data` carries a string for
/// `text`/`sql`/`download` and a row sequence for `table`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub question: String,
    pub answer: String,
    pub session_id: String,
    pub success: bool,
    #[serde(default)]
    pub data: ResponseData,
    #[serde(rename = "type", default)]
    pub kind: ResponseKind,
}

impl ResponseEnvelope {
    /// An empty failure envelope; the orchestrator fills it in per branch.
    pub fn new(question: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: String::new(),
            session_id: session_id.into(),
            success: false,
            data: ResponseData::default(),
            kind: ResponseKind::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_display_and_label() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
        assert_eq!(Role::System.label(), "System");
    }

    #[test]
    fn response_kind_serializes_lowercase() {
        let json = serde_json::to_string(&ResponseKind::Download).unwrap();
        assert_eq!(json, "\"download\"");
        let parsed: ResponseKind = serde_json::from_str("\"table\"").unwrap();
        assert_eq!(parsed, ResponseKind::Table);
    }

    #[test]
    fn envelope_defaults_to_text_failure() {
        let env = ResponseEnvelope::new("q", "s");
        assert!(!env.success);
        assert_eq!(env.kind, ResponseKind::Text);
        assert_eq!(env.data, ResponseData::Text(String::new()));
    }

    #[test]
    fn envelope_type_field_name() {
        let mut env = ResponseEnvelope::new("q", "s");
        env.kind = ResponseKind::Sql;
        env.data = ResponseData::Text("SELECT 1".into());
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["type"], "sql");
        assert_eq!(json["data"], "SELECT 1");
    }

    #[test]
    fn envelope_table_data_round_trips() {
        let mut row = Row::new();
        row.insert("installs".into(), serde_json::json!(42));
        let mut env = ResponseEnvelope::new("q", "s");
        env.success = true;
        env.kind = ResponseKind::Table;
        env.data = ResponseData::Rows(vec![row]);
        let json = serde_json::to_string(&env).unwrap();
        let back: ResponseEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind, ResponseKind::Table);
        match back.data {
            ResponseData::Rows(rows) => assert_eq!(rows[0]["installs"], 42),
            other => panic!("expected rows, got {other:?}"),
        }
    }

    #[test]
    fn chat_message_metadata_defaults_empty() {
        let json = r#"{"id":"1","role":"user","content":"hi","timestamp":"2026-01-01T00:00:00Z"}"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert!(msg.metadata.is_empty());
        assert_eq!(msg.role, Role::User);
    }
}
