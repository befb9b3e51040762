use crate::config::GatewayConfig;
use crate::pipeline::event_map;
use crate::{BoxStream, Error, Result};
use bytes::Bytes;
use futures::TryStreamExt;
use reqwest::header::{HeaderValue, ACCEPT};
use std::time::Duration;
use tracing::debug;

const POOL_MAX_IDLE_PER_HOST: usize = 32;
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Upstream error bodies are truncated to this many characters before they
/// are kept in an error (they are logged, never returned to clients).
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Authenticated HTTP client for one upstream provider.
pub struct HttpTransport {
    client: reqwest::Client,
    api_key: String,
    organization: Option<String>,
    /// Whole-request limit for buffered calls; header limit for streams.
    request_timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(Error::Configuration(crate::ConfigError::MissingApiKey))?;

        // No client-wide timeout: it would also cut committed streams.
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .pool_idle_timeout(Some(POOL_IDLE_TIMEOUT))
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            api_key,
            organization: config.organization.clone(),
            request_timeout: config.http_timeout(),
        })
    }

    fn post(&self, url: &str, body: &serde_json::Value) -> reqwest::RequestBuilder {
        let mut req = self.client.post(url).bearer_auth(&self.api_key).json(body);
        if let Some(org) = &self.organization {
            req = req.header("OpenAI-Organization", org);
        }
        req
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let resp = req.send().await.map_err(TransportError::Http)?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| event_map::embedded_error(&v))
            .unwrap_or(body);
        debug!(status = status.as_u16(), "upstream returned non-success status");
        Err(Error::Remote {
            status: status.as_u16(),
            message: message.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        })
    }

    /// POST a JSON body and decode the JSON reply.
    pub async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let resp = self
            .send(self.post(url, body).timeout(self.request_timeout))
            .await?;
        let bytes = resp.bytes().await.map_err(TransportError::Http)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// POST a JSON body and hand back the reply body as a byte stream.
    ///
    /// Status errors are reported before any byte is read. Only the wait for
    /// response headers is bounded by the request timeout; the body may run
    /// as long as upstream keeps sending. Dropping the returned stream drops
    /// the response and releases the connection.
    pub async fn post_stream(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<BoxStream<'static, Bytes>> {
        let req = self
            .post(url, body)
            .header(ACCEPT, HeaderValue::from_static("text/event-stream"));
        let resp = tokio::time::timeout(self.request_timeout, self.send(req))
            .await
            .map_err(|_| Error::Timeout {
                elapsed_ms: self.request_timeout.as_millis(),
            })??;

        let byte_stream = resp
            .bytes_stream()
            .map_err(|e| Error::Transport(TransportError::Http(e)));
        Ok(Box::pin(byte_stream))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
