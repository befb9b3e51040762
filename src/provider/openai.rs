//! OpenAI-compatible `chat/completions` provider.
//!
//! Works against OpenAI itself and any service exposing the same API
//! (`base_url` is configurable).

use async_trait::async_trait;
use serde_json::{json, Value};

use super::Provider;
use crate::config::GatewayConfig;
use crate::pipeline::{self, event_map};
use crate::transport::HttpTransport;
use crate::{CallRequest, Error, Result, TextStream};

const PROVIDER_ID: &str = "openai";

/// Provider speaking the OpenAI chat completions API.
pub struct OpenAiProvider {
    transport: HttpTransport,
    url: String,
}

impl OpenAiProvider {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::new(config)?,
            url: config.completions_url(),
        })
    }

    /// Request body for one call. The active system message goes first.
    pub fn build_body(request: &CallRequest, stream: bool) -> Value {
        let messages: Vec<Value> = request
            .normalized_messages()
            .iter()
            .map(|m| json!({ "role": m.role, "content": m.content }))
            .collect();

        let mut body = json!({
            "model": request.model,
            "messages": messages,
            "stream": stream,
        });
        if let Some(t) = request.params.temperature {
            body["temperature"] = json!(t);
        }
        if let Some(mt) = request.params.max_output_tokens {
            body["max_tokens"] = json!(mt);
        }
        body
    }

    /// Extracts the reply text of a buffered response.
    pub fn parse_response(body: &Value) -> Result<String> {
        if let Some(message) = event_map::embedded_error(body) {
            return Err(Error::invalid_response(PROVIDER_ID, message));
        }
        event_map::get_path(body, event_map::MESSAGE_CONTENT_PATH)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                Error::invalid_response(PROVIDER_ID, "response has no choices[0].message.content")
            })
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    async fn complete(&self, request: &CallRequest) -> Result<String> {
        let body = Self::build_body(request, false);
        let reply = self.transport.post_json(&self.url, &body).await?;
        Self::parse_response(&reply)
    }

    async fn stream(&self, request: &CallRequest) -> Result<TextStream> {
        let body = Self::build_body(request, true);
        let bytes = self.transport.post_stream(&self.url, &body).await?;
        Ok(pipeline::text_stream(bytes))
    }
}
