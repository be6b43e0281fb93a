// SPDX-FileCopyrightText: 2026 Sequin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenAI-compatible chat completions endpoints.
//!
//! Handles authentication, request construction, and a single retry on
//! transient errors (429, 500, 503, 529).

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use tracing::{debug, warn};

use sequin_core::SequinError;

use crate::types::{ApiErrorResponse, ChatRequest, ChatResponse};

/// Chat completions client.
///
/// The endpoint URL is taken whole from configuration, so any
/// OpenAI-compatible server (local proxies included) works unchanged.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    max_retries: u32,
}

impl OpenAiClient {
    pub fn new(
        api_key: &str,
        endpoint: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, SequinError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| SequinError::Config(format!("invalid api key header value: {e}")))?;
        auth.set_sensitive(true);
        headers.insert("authorization", auth);
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| SequinError::Backend {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint,
            model,
            max_retries: 1,
        })
    }

    /// The model identifier sent with every request.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a completion request.
    ///
    /// Transient errors are retried once after a 1-second delay; everything
    /// else surfaces immediately with the API's own error message when the
    /// body parses as one.
    pub async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, SequinError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying completion after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .json(request)
                .send()
                .await
                .map_err(|e| SequinError::Backend {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "completion response received");

            if status.is_success() {
                return response.json().await.map_err(|e| SequinError::Backend {
                    message: format!("failed to decode completion response: {e}"),
                    source: Some(Box::new(e)),
                });
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(SequinError::Backend {
                    message: format!("API returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "API error ({}): {}",
                    api_err.error.kind.as_deref().unwrap_or("unknown"),
                    api_err.error.message
                ),
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(SequinError::Backend {
                message,
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| SequinError::Backend {
            message: "completion failed after retries".into(),
            source: None,
        }))
    }
}

/// Whether an HTTP status warrants a retry.
fn is_transient_error(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503 | 529)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatRequestMessage;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4".into(),
            messages: vec![ChatRequestMessage::user("hi")],
            temperature: 0.1,
        }
    }

    fn client(server: &MockServer) -> OpenAiClient {
        OpenAiClient::new(
            "sk-test",
            format!("{}/v1/chat/completions", server.uri()),
            "gpt-4".into(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn ok_body() -> serde_json::Value {
        serde_json::json!({
            "choices": [{
                "message": {"role": "assistant", "content": "hello"},
                "finish_reason": "stop"
            }]
        })
    }

    #[tokio::test]
    async fn successful_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .mount(&server)
            .await;

        let response = client(&server).complete(&request()).await.unwrap();
        assert_eq!(response.choices[0].message.content.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn transient_error_retried_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server).complete(&request()).await.unwrap();
        assert_eq!(response.choices.len(), 1);
    }

    #[tokio::test]
    async fn transient_error_not_retried_twice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .expect(2)
            .mount(&server)
            .await;

        let err = client(&server).complete(&request()).await.unwrap_err();
        assert!(matches!(err, SequinError::Backend { .. }));
    }

    #[tokio::test]
    async fn api_error_message_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).complete(&request()).await.unwrap_err();
        assert!(err.to_string().contains("Incorrect API key provided"));
    }
}
