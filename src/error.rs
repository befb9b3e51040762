use crate::transport::TransportError;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path that caused the error (e.g., "request.messages", "request.temperature")
    pub field_path: Option<String>,
    /// Source of the error (e.g., "request_validator", "openai_provider")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Unified error type for the gateway.
///
/// Low-level failures are gathered here and classified exactly once, by
/// [`crate::ErrorKind::classify`], before anything reaches an HTTP client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {0}")]
    Configuration(#[from] crate::config::ConfigError),

    #[error("Remote error: HTTP {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid upstream response: {message}{}", format_context(.context))]
    InvalidResponse {
        message: String,
        context: ErrorContext,
    },

    #[error("Upstream attempt timed out after {elapsed_ms} ms")]
    Timeout { elapsed_ms: u128 },
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a validation error for a specific request field.
    pub fn validation(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Error::Validation {
            message: msg.into(),
            context: ErrorContext::new()
                .with_field_path(field)
                .with_source("request_validator"),
        }
    }

    /// Create a malformed-response error attributed to `source`.
    pub fn invalid_response(source: impl Into<String>, msg: impl Into<String>) -> Self {
        Error::InvalidResponse {
            message: msg.into(),
            context: ErrorContext::new().with_source(source),
        }
    }

    /// Upstream HTTP status carried by this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Remote { status, .. } => Some(*status),
            Error::Transport(TransportError::Http(e)) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
