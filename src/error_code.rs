//! 错误分类：上游失败到 HTTP 状态码与用户可见消息的映射。
//!
//! Error taxonomy for terminal outcomes.
//!
//! Every failure that leaves the gateway is reduced to one of four kinds. The
//! kind alone decides the HTTP status and the message shown to the end user;
//! raw upstream bodies never reach the response.
//!
//! | Kind | Trigger | HTTP status |
//! |------|---------|-------------|
//! | `RateLimited` | upstream 429 | 503 |
//! | `Unauthorized` | upstream 401 / 403 | 500 |
//! | `Unavailable` | any other upstream, network or decoding failure | 500 |
//! | `InvalidRequest` | local request validation | 400 |
//!
//! ## Example
//!
//! ```rust
//! use study_ai_gateway::ErrorKind;
//!
//! let kind = ErrorKind::from_status(Some(429));
//! assert_eq!(kind, ErrorKind::RateLimited);
//! assert_eq!(kind.http_status(), 503);
//! assert!(kind.retryable());
//! ```

use crate::Error;
use std::fmt;

/// Classified failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Upstream answered 429
    RateLimited,
    /// Upstream rejected our credentials (401 / 403)
    Unauthorized,
    /// Any other upstream, network or malformed-response failure
    Unavailable,
    /// The inbound request is missing or has invalid fields; never reaches upstream
    InvalidRequest,
}

impl ErrorKind {
    /// Classifies an upstream status code. `None` means no HTTP response was
    /// received at all (connection failure, timeout, undecodable body).
    pub fn from_status(status: Option<u16>) -> Self {
        match status {
            Some(429) => Self::RateLimited,
            Some(401) | Some(403) => Self::Unauthorized,
            _ => Self::Unavailable,
        }
    }

    /// Single classification point for every crate error.
    pub fn classify(err: &Error) -> Self {
        match err {
            Error::Validation { .. } => Self::InvalidRequest,
            Error::Remote { status, .. } => Self::from_status(Some(*status)),
            Error::Transport(_) => Self::from_status(err.status_code()),
            Error::Serialization(_)
            | Error::InvalidResponse { .. }
            | Error::Timeout { .. }
            | Error::Configuration(_) => Self::Unavailable,
        }
    }

    /// HTTP status returned to the client for a terminal failure of this kind.
    #[inline]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::RateLimited => 503,
            Self::Unauthorized | Self::Unavailable => 500,
            Self::InvalidRequest => 400,
        }
    }

    /// Whether the policy may try again after a failure of this kind.
    ///
    /// `Unauthorized` is reported as retryable; whether it is actually retried
    /// is decided by `RetrySettings::retry_unauthorized`.
    #[inline]
    pub fn retryable(&self) -> bool {
        !matches!(self, Self::InvalidRequest)
    }

    /// Fixed user-visible message. `InvalidRequest` carries a field-specific
    /// message instead; this is only its generic fallback.
    #[inline]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::RateLimited => "service experiencing high demand, retry shortly",
            Self::Unauthorized => "authentication error with the AI service",
            Self::Unavailable => "AI service temporarily unavailable",
            Self::InvalidRequest => "invalid request",
        }
    }

    /// Stable snake_case name used in structured logs.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::Unauthorized => "unauthorized",
            Self::Unavailable => "unavailable",
            Self::InvalidRequest => "invalid_request",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_matches_table() {
        assert_eq!(ErrorKind::from_status(Some(429)), ErrorKind::RateLimited);
        assert_eq!(ErrorKind::from_status(Some(401)), ErrorKind::Unauthorized);
        assert_eq!(ErrorKind::from_status(Some(403)), ErrorKind::Unauthorized);
        for status in [400u16, 404, 500, 502, 503, 529] {
            assert_eq!(
                ErrorKind::from_status(Some(status)),
                ErrorKind::Unavailable,
                "status {} should be unavailable",
                status
            );
        }
        assert_eq!(ErrorKind::from_status(None), ErrorKind::Unavailable);
    }

    #[test]
    fn http_status_per_kind() {
        assert_eq!(ErrorKind::RateLimited.http_status(), 503);
        assert_eq!(ErrorKind::Unauthorized.http_status(), 500);
        assert_eq!(ErrorKind::Unavailable.http_status(), 500);
        assert_eq!(ErrorKind::InvalidRequest.http_status(), 400);
    }

    #[test]
    fn classify_crate_errors() {
        let remote = Error::Remote {
            status: 429,
            message: "slow down".into(),
        };
        assert_eq!(ErrorKind::classify(&remote), ErrorKind::RateLimited);

        let invalid = Error::validation("request.messages", "messages must not be empty");
        assert_eq!(ErrorKind::classify(&invalid), ErrorKind::InvalidRequest);

        let malformed = Error::invalid_response("openai", "missing choices");
        assert_eq!(ErrorKind::classify(&malformed), ErrorKind::Unavailable);

        let timeout = Error::Timeout { elapsed_ms: 10 };
        assert_eq!(ErrorKind::classify(&timeout), ErrorKind::Unavailable);
    }

    #[test]
    fn only_invalid_request_is_final() {
        assert!(ErrorKind::RateLimited.retryable());
        assert!(ErrorKind::Unauthorized.retryable());
        assert!(ErrorKind::Unavailable.retryable());
        assert!(!ErrorKind::InvalidRequest.retryable());
    }
}
