// SPDX-FileCopyrightText: 2026 Triage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the OpenAI chat completions API.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, warn};
use triage_core::TriageError;

use crate::types::{ApiErrorResponse, ChatRequest, ChatResponse};

/// Delay between attempts on transient statuses.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Chat completions client with bearer auth, a request timeout, and bounded
/// retry on transient statuses (429, 500, 503).
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    endpoint: String,
    max_retries: u32,
}

impl OpenAiClient {
    pub fn new(
        api_key: &str,
        endpoint: String,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, TriageError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| TriageError::Config(format!("invalid API key header value: {e}")))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| TriageError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint,
            max_retries,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends one chat completion and returns the decoded envelope.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, TriageError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying chat completion after transient error");
                tokio::time::sleep(RETRY_DELAY).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .json(request)
                .send()
                .await
                .map_err(|e| TriageError::Provider {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "chat completion response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| TriageError::Provider {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                return serde_json::from_str(&body).map_err(|e| TriageError::Provider {
                    message: format!("failed to parse API response: {e}"),
                    source: Some(Box::new(e)),
                });
            }

            let body = response.text().await.unwrap_or_default();
            let error = TriageError::Provider {
                message: describe_error(status, &body),
                source: None,
            };
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, "transient error, will retry");
                last_error = Some(error);
                continue;
            }
            return Err(error);
        }

        Err(last_error.unwrap_or_else(|| TriageError::Provider {
            message: "chat completion failed after retries".into(),
            source: None,
        }))
    }
}

fn describe_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(api_err) => match api_err.error.type_ {
            Some(kind) => format!("OpenAI API error {status} ({kind}): {}", api_err.error.message),
            None => format!("OpenAI API error {status}: {}", api_err.error.message),
        },
        Err(_) => format!("API returned {status}: {body}"),
    }
}

fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer, max_retries: u32) -> OpenAiClient {
        OpenAiClient::new(
            "sk-test",
            format!("{}/v1/chat/completions", server.uri()),
            Duration::from_secs(5),
            max_retries,
        )
        .unwrap()
    }

    fn test_request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4-turbo-preview".into(),
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("hello")],
            temperature: 0.3,
            max_tokens: 500,
        }
    }

    fn ok_body(id: &str, text: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "object": "chat.completion",
            "model": "gpt-4-turbo-preview",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": text},
                "finish_reason": "stop"
            }]
        })
    }

    #[tokio::test]
    async fn chat_success_sends_auth_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4-turbo-preview",
                "max_tokens": 500
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("c1", "{}")))
            .expect(1)
            .mount(&server)
            .await;

        let resp = test_client(&server, 0).chat(&test_request()).await.unwrap();
        assert_eq!(resp.id, "c1");
        assert_eq!(resp.first_text(), Some("{}"));
    }

    #[tokio::test]
    async fn no_retry_by_default() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server, 0).chat(&test_request()).await.unwrap_err();
        assert!(err.to_string().contains("503"), "got: {err}");
    }

    #[tokio::test]
    async fn retries_transient_status_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("c2", "ok")))
            .mount(&server)
            .await;

        let resp = test_client(&server, 1).chat(&test_request()).await.unwrap();
        assert_eq!(resp.id, "c2");
    }

    #[tokio::test]
    async fn client_error_surfaces_api_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "Incorrect API key", "type": "invalid_request_error"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server, 3).chat(&test_request()).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Incorrect API key"), "got: {msg}");
        assert!(msg.contains("invalid_request_error"), "got: {msg}");
    }

    #[tokio::test]
    async fn malformed_envelope_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = test_client(&server, 0).chat(&test_request()).await.unwrap_err();
        assert!(matches!(err, TriageError::Provider { .. }));
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(ok_body("c3", "late"))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = OpenAiClient::new(
            "sk-test",
            format!("{}/v1/chat/completions", server.uri()),
            Duration::from_millis(50),
            0,
        )
        .unwrap();
        assert!(client.chat(&test_request()).await.is_err());
    }
}
