//! 上游调用策略：统一的重试、指数退避与流式回退。
//!
//! # Upstream Call Policy
//!
//! Every AI-backed route hands its request to one [`UpstreamCallPolicy`]. The
//! policy owns everything between "request is shaped" and "response can be
//! relayed":
//!
//! - local validation (invalid requests never reach upstream)
//! - bounded attempts with `base_delay * 2^attempt` backoff between them,
//!   waited with `tokio::time::sleep` so other requests keep running
//! - an optional one-way switch from streamed to buffered delivery
//! - classification of the final failure into an [`ErrorKind`]
//!
//! ## Streams
//!
//! A streamed attempt is only committed once its first chunk arrives (or it
//! ends cleanly without any). An error before that point is an ordinary
//! attempt failure and may be retried; after it, the stream belongs to the
//! caller and is never restarted, since chunks may already be on the wire.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cancel`] | [`ControlledStream`] and [`CancelHandle`] |
//! | [`outcome`] | [`CallOutcome`] and [`Failure`] |

pub mod cancel;
pub mod outcome;


pub use cancel::{CancelHandle, ControlledStream};
pub use outcome::{CallOutcome, Failure};

use crate::config::RetrySettings;
use crate::provider::Provider;
use crate::{CallRequest, Error, ErrorKind, Result, TextStream};
use futures::StreamExt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// How an attempt asks upstream to deliver its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    Streamed,
    Buffered,
}

/// What one upstream invocation produced.
pub enum Delivery {
    Stream(TextStream),
    Text(String),
}

/// Attempt bookkeeping for one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    /// 0-based index of the current attempt
    pub attempt: u32,
    pub max_attempts: u32,
}

impl RetryState {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            attempt: 0,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn is_last(&self) -> bool {
        self.attempt + 1 >= self.max_attempts
    }

    /// Wait before the attempt following the current one: `base * 2^attempt`.
    pub fn backoff(&self, base: Duration) -> Duration {
        let factor = 1u32.checked_shl(self.attempt).unwrap_or(u32::MAX);
        base.saturating_mul(factor)
    }

    pub fn advance(&mut self) {
        self.attempt = self.attempt.saturating_add(1);
    }

    /// Attempts started so far, the current one included.
    pub fn attempts_used(&self) -> u32 {
        self.attempt + 1
    }
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    Retry { delay: Duration },
    /// Retry, with this and every later attempt buffered
    Fallback { delay: Duration },
    Fail,
    DeadlineExceeded,
}

/// The single retry/backoff/fallback policy shared by every route.
#[derive(Debug, Clone)]
pub struct UpstreamCallPolicy {
    settings: RetrySettings,
}

impl UpstreamCallPolicy {
    pub fn new(settings: RetrySettings) -> Self {
        Self { settings }
    }

    /// Copy of this policy with streaming→buffered fallback switched on or off.
    pub fn with_stream_fallback(&self, enable: bool) -> Self {
        Self::new(self.settings.clone().with_stream_fallback(enable))
    }

    /// Runs `request` against `provider`.
    pub async fn execute<P>(&self, provider: &P, request: &CallRequest, mode: CallMode) -> CallOutcome
    where
        P: Provider + ?Sized,
    {
        debug!(provider = provider.id(), mode = ?mode, "executing upstream call");
        self.execute_with(request, mode, move |mode| async move {
            match mode {
                CallMode::Streamed => provider.stream(request).await.map(Delivery::Stream),
                CallMode::Buffered => provider.complete(request).await.map(Delivery::Text),
            }
        })
        .await
    }

    /// Runs `request` through `invoke`, which performs exactly one upstream
    /// call in the given mode each time it is called.
    pub async fn execute_with<F, Fut>(
        &self,
        request: &CallRequest,
        mode: CallMode,
        mut invoke: F,
    ) -> CallOutcome
    where
        F: FnMut(CallMode) -> Fut,
        Fut: Future<Output = Result<Delivery>>,
    {
        if let Err(e) = request.validate() {
            let failure = Failure::from_error(&e, 0);
            info!(kind = %failure.kind, message = %failure.message, "rejected invalid request");
            return CallOutcome::Failure(failure);
        }

        let deadline = self.settings.deadline().map(|d| Instant::now() + d);
        let mut state = RetryState::new(self.settings.max_attempts);
        let mut mode = mode;

        loop {
            let err = match self.attempt(&mut invoke, mode, deadline).await {
                Ok(Delivery::Stream(stream)) => {
                    debug!(attempt = state.attempts_used(), "stream committed");
                    return CallOutcome::StreamedSuccess(ControlledStream::new(stream));
                }
                Ok(Delivery::Text(text)) => {
                    debug!(attempt = state.attempts_used(), "buffered reply received");
                    return CallOutcome::BufferedSuccess(text);
                }
                Err(e) => e,
            };

            let kind = ErrorKind::classify(&err);
            let status = err.status_code();
            warn!(
                attempt = state.attempts_used(),
                max_attempts = state.max_attempts,
                kind = %kind,
                status = ?status,
                mode = ?mode,
                error = %err,
                "upstream attempt failed"
            );

            let delay = match self.decide(&state, kind, mode, deadline) {
                Decision::Retry { delay } => delay,
                Decision::Fallback { delay } => {
                    info!(
                        attempt = state.attempts_used(),
                        "switching remaining attempts to buffered delivery"
                    );
                    mode = CallMode::Buffered;
                    delay
                }
                Decision::Fail => {
                    let failure = Failure::from_error(&err, state.attempts_used());
                    error!(
                        attempts = failure.attempts,
                        kind = %failure.kind,
                        status = ?failure.status,
                        "upstream call failed"
                    );
                    return CallOutcome::Failure(failure);
                }
                Decision::DeadlineExceeded => {
                    let failure = Failure::deadline_exceeded(status, state.attempts_used());
                    error!(
                        attempts = failure.attempts,
                        kind = %failure.kind,
                        last_kind = %kind,
                        "upstream call failed: deadline would be exceeded by next backoff"
                    );
                    return CallOutcome::Failure(failure);
                }
            };

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            state.advance();
        }
    }

    pub(crate) fn decide(
        &self,
        state: &RetryState,
        kind: ErrorKind,
        mode: CallMode,
        deadline: Option<Instant>,
    ) -> Decision {
        if !kind.retryable() || state.is_last() {
            return Decision::Fail;
        }
        if kind == ErrorKind::Unauthorized {
            if !self.settings.retry_unauthorized {
                return Decision::Fail;
            }
            warn!(
                attempt = state.attempts_used(),
                "retrying upstream authorization failure; credentials are unlikely to change between attempts"
            );
        }

        let delay = state.backoff(self.settings.base_delay());
        if let Some(remaining) = remaining(deadline) {
            if delay >= remaining {
                return Decision::DeadlineExceeded;
            }
        }

        if self.settings.stream_fallback && mode == CallMode::Streamed {
            Decision::Fallback { delay }
        } else {
            Decision::Retry { delay }
        }
    }

    /// One upstream invocation. Streams are peeked: the attempt only succeeds
    /// once the first chunk arrived or the stream ended cleanly.
    async fn attempt<F, Fut>(
        &self,
        invoke: &mut F,
        mode: CallMode,
        deadline: Option<Instant>,
    ) -> Result<Delivery>
    where
        F: FnMut(CallMode) -> Fut,
        Fut: Future<Output = Result<Delivery>>,
    {
        let call = invoke(mode);
        let peeked = async move {
            match call.await? {
                Delivery::Stream(mut stream) => match stream.next().await {
                    None => Ok(Delivery::Stream(Box::pin(futures::stream::empty::<Result<String>>()))),
                    Some(Ok(first)) => {
                        let rest = futures::stream::once(async move { Ok(first) }).chain(stream);
                        Ok(Delivery::Stream(Box::pin(rest)))
                    }
                    Some(Err(e)) => Err(e),
                },
                text => Ok(text),
            }
        };

        match attempt_timeout(self.settings.attempt_timeout(), deadline) {
            Some(limit) => match tokio::time::timeout(limit, peeked).await {
                Ok(result) => result,
                Err(_) => Err(Error::Timeout {
                    elapsed_ms: limit.as_millis(),
                }),
            },
            None => peeked.await,
        }
    }
}

fn remaining(deadline: Option<Instant>) -> Option<Duration> {
    deadline.map(|deadline| deadline.saturating_duration_since(Instant::now()))
}

/// Per-attempt limit: the configured timeout capped by what is left of the deadline.
fn attempt_timeout(configured: Option<Duration>, deadline: Option<Instant>) -> Option<Duration> {
    match (configured, remaining(deadline)) {
        (Some(configured), Some(remaining)) => Some(configured.min(remaining)),
        (Some(configured), None) => Some(configured),
        (None, Some(remaining)) => Some(remaining),
        (None, None) => None,
    }
    .map(|limit| limit.max(Duration::from_millis(1)))
}
