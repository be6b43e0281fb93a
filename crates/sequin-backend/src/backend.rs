// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Natural-language-to-SQL generation over the chat completions client.
//!
//! Sends the analytics system prompt plus conversation context and parses
//! the model's structured JSON reply into a [`Generation`]. Models do not
//! always follow output instructions, so parsing is layered: strict JSON
//! first, then a JSON object dug out of surrounding prose, then SQL
//! recovered from a tool-call trace. Only when every layer fails does the
//! call error.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use sequin_core::traits::GenerationBackend;
use sequin_core::{Generation, Row, SequinError};

use crate::client::OpenAiClient;
use crate::types::{ChatRequest, ChatRequestMessage, ChatResponseMessage};

/// Analytics system prompt. The reply must be a single JSON object with
/// `interpreted_answer`, `sql_query`, and `exec_result`.
const SYSTEM_PROMPT: &str = r#"You are an expert SQL analyst for a mobile app analytics database.

RULES (must follow strictly):
1) Convert the user's natural language question into an efficient PostgreSQL query over the schema below.
2) Execute the query exactly once.
3) Interpret the results for a business audience.
4) OUTPUT FORMAT: return a single JSON object with exactly the keys
   "interpreted_answer" (string), "sql_query" (string), and
   "exec_result" (array of row objects).
   - Do NOT include any extra text, explanations, code fences, or markdown.
   - Do NOT add fields not in the schema.
   - If a step fails, still return a valid JSON object; set "exec_result"
     to [] and explain in "interpreted_answer".

DATABASE SCHEMA:
Table: app_metrics
- id (bigint): Primary key
- app_name (text): Name of the mobile app
- platform (text): 'iOS' or 'Android'
- date (date): Date of the metrics
- country (text): Country code (US, GB, DE, FR, CA, AU, etc.)
- installs (integer): Number of app installs
- in_app_revenue (numeric): Revenue from in-app purchases in USD
- ads_revenue (numeric): Revenue from advertisements in USD
- ua_cost (numeric): User acquisition cost in USD
"#;

/// The structured reply shape the prompt demands.
#[derive(Debug, Deserialize)]
struct StructuredReply {
    interpreted_answer: String,
    #[serde(default)]
    sql_query: String,
    #[serde(default)]
    exec_result: Vec<Row>,
}

/// [`GenerationBackend`] over an OpenAI-compatible chat endpoint.
pub struct NlToSqlBackend {
    client: OpenAiClient,
    temperature: f32,
}

impl NlToSqlBackend {
    pub fn new(client: OpenAiClient) -> Self {
        Self {
            client,
            temperature: 0.1,
        }
    }

    fn user_message(question: &str, context: &str) -> String {
        if context.is_empty() {
            question.to_string()
        } else {
            format!("Previous conversation:\n{context}\n\nCurrent question: {question}")
        }
    }
}

#[async_trait]
impl GenerationBackend for NlToSqlBackend {
    #[instrument(skip_all, fields(model = self.client.model()))]
    async fn generate(
        &self,
        question: &str,
        context: &str,
    ) -> Result<Generation, SequinError> {
        let request = ChatRequest {
            model: self.client.model().to_string(),
            messages: vec![
                ChatRequestMessage::system(SYSTEM_PROMPT),
                ChatRequestMessage::user(Self::user_message(question, context)),
            ],
            temperature: self.temperature,
        };

        let response = self.client.complete(&request).await?;
        let message = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| SequinError::Parse("reply contained no choices".to_string()))?;

        parse_generation(&message)
    }
}

/// Turn a reply message into a [`Generation`], trying each recovery layer
/// in order.
fn parse_generation(message: &ChatResponseMessage) -> Result<Generation, SequinError> {
    if let Some(content) = message.content.as_deref() {
        if let Some(reply) = parse_structured(content) {
            debug!(rows = reply.exec_result.len(), "structured reply parsed");
            return Ok(Generation {
                answer: reply.interpreted_answer,
                sql: reply.sql_query,
                rows: reply.exec_result,
            });
        }
    }

    // The model invoked its tool instead of answering in shape. Recover the
    // SQL from the call arguments; rows are unrecoverable from here.
    if let Some(sql) = sql_from_tool_calls(message) {
        warn!("structured reply missing, recovered sql from tool call");
        return Ok(Generation {
            answer: message
                .content
                .as_deref()
                .unwrap_or("The query was executed but no summary was produced.")
                .trim()
                .to_string(),
            sql,
            rows: Vec::new(),
        });
    }

    Err(SequinError::Parse(
        "reply was neither a structured answer nor a tool-call trace".to_string(),
    ))
}

/// Parse the structured reply, tolerating code fences and surrounding prose.
fn parse_structured(content: &str) -> Option<StructuredReply> {
    let trimmed = strip_code_fences(content.trim());
    if let Ok(reply) = serde_json::from_str(trimmed) {
        return Some(reply);
    }
    // Dig the outermost object out of surrounding prose.
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}

fn strip_code_fences(content: &str) -> &str {
    let content = content
        .strip_prefix("```json")
        .or_else(|| content.strip_prefix("```"))
        .unwrap_or(content);
    content.strip_suffix("```").unwrap_or(content).trim()
}

/// Arguments shape of the sql_executor tool.
#[derive(Deserialize)]
struct SqlToolArgs {
    query: String,
}

fn sql_from_tool_calls(message: &ChatResponseMessage) -> Option<String> {
    message
        .tool_calls
        .iter()
        .filter(|call| call.function.name == "sql_executor")
        .find_map(|call| {
            serde_json::from_str::<SqlToolArgs>(&call.function.arguments)
                .ok()
                .map(|args| args.query)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ToolCall, ToolFunction};
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message(content: Option<&str>, tool_calls: Vec<ToolCall>) -> ChatResponseMessage {
        ChatResponseMessage {
            content: content.map(str::to_string),
            tool_calls,
        }
    }

    const REPLY: &str = r#"{
        "interpreted_answer": "Weather Now leads with 1200 installs.",
        "sql_query": "SELECT app_name, SUM(installs) FROM app_metrics GROUP BY app_name",
        "exec_result": [{"app_name": "Weather Now", "installs": 1200}]
    }"#;

    #[test]
    fn strict_json_parses() {
        let generation = parse_generation(&message(Some(REPLY), vec![])).unwrap();
        assert_eq!(generation.answer, "Weather Now leads with 1200 installs.");
        assert!(generation.sql.starts_with("SELECT app_name"));
        assert_eq!(generation.rows.len(), 1);
    }

    #[test]
    fn code_fenced_json_parses() {
        let fenced = format!("```json\n{REPLY}\n```");
        let generation = parse_generation(&message(Some(&fenced), vec![])).unwrap();
        assert_eq!(generation.rows.len(), 1);
    }

    #[test]
    fn json_inside_prose_parses() {
        let chatty = format!("Here is your result:\n{REPLY}\nLet me know if you need more.");
        let generation = parse_generation(&message(Some(&chatty), vec![])).unwrap();
        assert_eq!(generation.rows.len(), 1);
    }

    #[test]
    fn missing_optional_fields_default() {
        let minimal = r#"{"interpreted_answer": "No data found."}"#;
        let generation = parse_generation(&message(Some(minimal), vec![])).unwrap();
        assert_eq!(generation.answer, "No data found.");
        assert!(generation.sql.is_empty());
        assert!(generation.rows.is_empty());
    }

    #[test]
    fn tool_call_trace_recovers_sql() {
        let calls = vec![ToolCall {
            function: ToolFunction {
                name: "sql_executor".into(),
                arguments: r#"{"query": "SELECT 1"}"#.into(),
            },
        }];
        let generation = parse_generation(&message(None, calls)).unwrap();
        assert_eq!(generation.sql, "SELECT 1");
        assert!(generation.rows.is_empty());
    }

    #[test]
    fn unrelated_tool_call_does_not_recover() {
        let calls = vec![ToolCall {
            function: ToolFunction {
                name: "web_search".into(),
                arguments: r#"{"query": "SELECT 1"}"#.into(),
            },
        }];
        let err = parse_generation(&message(None, calls)).unwrap_err();
        assert!(matches!(err, SequinError::Parse(_)));
    }

    #[test]
    fn garbage_reply_is_a_parse_error() {
        let err = parse_generation(&message(Some("I cannot help with that."), vec![]))
            .unwrap_err();
        assert!(matches!(err, SequinError::Parse(_)));
    }

    #[test]
    fn user_message_includes_context_when_present() {
        assert_eq!(NlToSqlBackend::user_message("q", ""), "q");
        let with_context = NlToSqlBackend::user_message("and for iOS?", "User: top apps?");
        assert!(with_context.contains("User: top apps?"));
        assert!(with_context.contains("and for iOS?"));
    }

    #[tokio::test]
    async fn generate_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-4"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{
                    "message": {"role": "assistant", "content": REPLY},
                    "finish_reason": "stop"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiClient::new(
            "sk-test",
            format!("{}/v1/chat/completions", server.uri()),
            "gpt-4".into(),
            Duration::from_secs(5),
        )
        .unwrap();
        let backend = NlToSqlBackend::new(client);
        let generation = backend.generate("top apps?", "").await.unwrap();
        assert_eq!(generation.rows[0]["installs"], 1200);
    }
}
