//! Mock upstream setup for integration tests

#![allow(dead_code)]

use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::json;
use study_ai_gateway::{GatewayConfig, RetrySettings};

pub const COMPLETIONS_PATH: &str = "/chat/completions";
pub const API_KEY: &str = "test-key";

/// Test fixture that manages a mock OpenAI-compatible upstream
pub struct MockUpstream {
    pub server: ServerGuard,
}

impl MockUpstream {
    pub async fn new() -> Self {
        Self {
            server: Server::new_async().await,
        }
    }

    /// Gateway config pointed at this upstream with millisecond backoff.
    pub fn config(&self) -> GatewayConfig {
        GatewayConfig {
            api_key: Some(API_KEY.to_string()),
            base_url: self.server.url(),
            http_timeout_secs: 5,
            retry: RetrySettings {
                base_delay_ms: 1,
                ..RetrySettings::default()
            },
            ..GatewayConfig::default()
        }
    }

    fn completions(&mut self, stream: bool) -> Mock {
        self.server
            .mock("POST", COMPLETIONS_PATH)
            .match_body(Matcher::PartialJson(json!({ "stream": stream })))
    }

    /// Buffered reply with `content`.
    pub async fn mock_completion(&mut self, content: &str) -> Mock {
        let body = json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }]
        });
        self.completions(false)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await
    }

    /// Streamed reply emitting one SSE frame per chunk, then `[DONE]`.
    pub async fn mock_stream(&mut self, chunks: &[&str]) -> Mock {
        let mut body: String = chunks
            .iter()
            .map(|chunk| {
                let frame = json!({
                    "object": "chat.completion.chunk",
                    "choices": [{"index": 0, "delta": {"content": chunk}}]
                });
                format!("data: {}\n\n", frame)
            })
            .collect();
        body.push_str("data: [DONE]\n\n");

        self.completions(true)
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await
    }

    /// Error status for calls in the given delivery mode.
    pub async fn mock_status(&mut self, stream: bool, status: usize, hits: usize) -> Mock {
        self.completions(stream)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(json!({"error": {"message": format!("status {}", status)}}).to_string())
            .expect(hits)
            .create_async()
            .await
    }

    /// Error status for any call, whatever the delivery mode.
    pub async fn mock_any_status(&mut self, status: usize, hits: usize) -> Mock {
        self.server
            .mock("POST", COMPLETIONS_PATH)
            .with_status(status)
            .with_body(json!({"error": {"message": "upstream failure"}}).to_string())
            .expect(hits)
            .create_async()
            .await
    }
}
