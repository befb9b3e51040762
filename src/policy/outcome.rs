use super::cancel::ControlledStream;
use crate::{Error, ErrorKind};

/// Terminal failure of one policy execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: ErrorKind,
    /// Last upstream HTTP status seen, if any
    pub status: Option<u16>,
    /// User-visible message; never the raw upstream body
    pub message: String,
    /// Upstream invocations made (0 when rejected locally)
    pub attempts: u32,
}

impl Failure {
    pub(crate) fn from_error(err: &Error, attempts: u32) -> Self {
        let kind = ErrorKind::classify(err);
        let message = match err {
            Error::Validation { message, .. } => message.clone(),
            _ => kind.user_message().to_string(),
        };
        Self {
            kind,
            status: err.status_code(),
            message,
            attempts,
        }
    }

    pub(crate) fn deadline_exceeded(status: Option<u16>, attempts: u32) -> Self {
        let kind = ErrorKind::Unavailable;
        Self {
            kind,
            status,
            message: kind.user_message().to_string(),
            attempts,
        }
    }

    /// Status returned to the client.
    pub fn http_status(&self) -> u16 {
        self.kind.http_status()
    }
}

/// Result of [`super::UpstreamCallPolicy::execute`].
#[derive(Debug)]
pub enum CallOutcome {
    /// A committed stream; at least the first chunk (or a clean end) was seen.
    StreamedSuccess(ControlledStream),
    BufferedSuccess(String),
    Failure(Failure),
}

impl CallOutcome {
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            CallOutcome::Failure(f) => Some(f),
            _ => None,
        }
    }
}
