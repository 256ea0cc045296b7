use std::time::Duration;

use async_trait::async_trait;
use colored::Colorize;
use tokio::time::sleep;

use crate::config::ClientConfig;
use crate::error::ChatError;
use crate::logging::{log_request, log_response, safe_truncate};
use crate::models::{ChatRequest, ChatResponse};

/// Default number of attempts before a transient failure becomes terminal.
pub const MAX_RETRIES: u32 = 5;

/// Transport seam for the orchestration loop. The HTTP implementation is
/// below; tests script responses through this trait.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError>;
}

/// Sends a single request to the chat-completion endpoint, retrying
/// transient failures (429/500/503) with exponential backoff and surfacing
/// everything else immediately.
pub struct HttpTransport {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    max_retries: u32,
    verbose: bool,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            max_retries: MAX_RETRIES,
            verbose: config.verbose,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    fn is_transient(status: reqwest::StatusCode) -> bool {
        matches!(status.as_u16(), 429 | 500 | 503)
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError> {
        let mut attempt: u32 = 0;

        loop {
            log_request(&self.api_url, request, &self.api_key, self.verbose);

            let response = self
                .client
                .post(&self.api_url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(request)
                .send()
                .await
                .map_err(|e| ChatError::transport(None, e.to_string()))?;

            let status = response.status();

            if Self::is_transient(status) {
                if attempt + 1 >= self.max_retries {
                    return Err(ChatError::transport(
                        Some(status.as_u16()),
                        format!(
                            "transient status {} persisted after {} attempts",
                            status, self.max_retries
                        ),
                    ));
                }

                let wait_time = Duration::from_secs(2u64.pow(attempt));
                if self.verbose {
                    println!(
                        "{} Status {}. Waiting {} seconds before retry {}/{}...",
                        "⏳".yellow(),
                        status,
                        wait_time.as_secs(),
                        attempt + 1,
                        self.max_retries
                    );
                }
                sleep(wait_time).await;
                attempt += 1;
                continue;
            }

            if !status.is_success() {
                let error_body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unable to read error body".to_string());
                log_response(status.as_u16(), &error_body, self.verbose);
                return Err(ChatError::transport(
                    Some(status.as_u16()),
                    format!("API request failed with status {}: {}", status, error_body),
                ));
            }

            let response_text = response
                .text()
                .await
                .map_err(|e| ChatError::transport(Some(status.as_u16()), e.to_string()))?;
            log_response(status.as_u16(), &response_text, self.verbose);

            let chat_response: ChatResponse =
                serde_json::from_str(&response_text).map_err(|e| {
                    ChatError::transport(
                        Some(status.as_u16()),
                        format!(
                            "failed to parse API response: {} ({})",
                            e,
                            safe_truncate(&response_text, 200)
                        ),
                    )
                })?;

            if chat_response.truncated() {
                eprintln!(
                    "{} Completion was truncated by the token limit",
                    "⚠️".yellow()
                );
            }

            return Ok(chat_response);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_request() -> ChatRequest {
        ChatRequest {
            model: "test-model".to_string(),
            temperature: None,
            max_tokens: None,
            tool_choice: None,
            tools: Vec::new(),
            messages: vec![crate::models::Message::user("hello")],
        }
    }

    fn success_body() -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-test",
            "model": "test-model",
            "choices": [{
                "message": { "role": "assistant", "content": "hi there" },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 5, "completion_tokens": 3, "total_tokens": 8 }
        })
    }

    fn transport_for(server: &MockServer) -> HttpTransport {
        let config = crate::config::ClientConfig::new("test-key")
            .with_api_url(&format!("{}/v1/chat/completions", server.uri()));
        HttpTransport::new(&config)
    }

    #[tokio::test]
    async fn success_parses_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .expect(1)
            .mount(&server)
            .await;

        let response = transport_for(&server).send(&test_request()).await.unwrap();
        assert_eq!(response.choices[0].message.content, "hi there");
        assert_eq!(response.usage.as_ref().unwrap().total_tokens, 8);
    }

    #[tokio::test]
    async fn rate_limit_retries_with_increasing_delay() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .expect(1)
            .mount(&server)
            .await;

        let started = Instant::now();
        let response = transport_for(&server).send(&test_request()).await.unwrap();
        assert_eq!(response.choices.len(), 1);
        // backoff slept 2^0 + 2^1 seconds before the third attempt
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test]
    async fn transient_status_gives_up_after_attempt_ceiling() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let transport = transport_for(&server).with_max_retries(3);
        let err = transport.send(&test_request()).await.unwrap_err();
        match err {
            ChatError::Transport { status, .. } => assert_eq!(status, Some(503)),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn terminal_status_aborts_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad request body"))
            .expect(1)
            .mount(&server)
            .await;

        let err = transport_for(&server).send(&test_request()).await.unwrap_err();
        match err {
            ChatError::Transport { status, reason } => {
                assert_eq!(status, Some(400));
                assert!(reason.contains("bad request body"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn truncated_completion_is_still_success() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "choices": [{
                "message": { "role": "assistant", "content": "partial answ" },
                "finish_reason": "length"
            }]
        });
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let response = transport_for(&server).send(&test_request()).await.unwrap();
        assert!(response.truncated());
    }
}
