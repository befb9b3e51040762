//! Cancellable relay around a committed upstream stream.
//!
//! Dropping a [`ControlledStream`] is enough to release the upstream
//! connection, which is what the HTTP layer relies on when a client goes
//! away. A caller that keeps the stream but wants it stopped from another
//! task (a shutdown hook, a user pressing "stop") takes a [`CancelHandle`]
//! with [`ControlledStream::cancel_handle`] and calls
//! [`CancelHandle::cancel`]; the stream then ends on its next poll.

use crate::{Result, TextStream};
use futures::task::AtomicWaker;
use futures::Stream;
use std::fmt;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::debug;

#[derive(Default)]
struct CancelState {
    cancelled: AtomicBool,
    waker: AtomicWaker,
}

/// Stops a [`ControlledStream`] from the outside.
///
/// Cloneable; cancelling more than once is a no-op.
#[derive(Clone)]
pub struct CancelHandle {
    state: Arc<CancelState>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        if !self.state.cancelled.swap(true, Ordering::SeqCst) {
            self.state.waker.wake();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// A committed upstream stream as handed to the HTTP layer.
///
/// Forwards chunks until the upstream ends, the first upstream error (which
/// is yielded and then ends the relay), or cancellation. On cancellation or
/// drop the upstream stream is dropped at once, which closes the upstream
/// connection.
pub struct ControlledStream {
    inner: Option<TextStream>,
    state: Arc<CancelState>,
    forwarded: u64,
}

impl ControlledStream {
    pub fn new(inner: TextStream) -> Self {
        Self {
            inner: Some(inner),
            state: Arc::new(CancelState::default()),
            forwarded: 0,
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            state: self.state.clone(),
        }
    }

    /// Chunks forwarded so far.
    pub fn forwarded(&self) -> u64 {
        self.forwarded
    }

    fn release(&mut self, reason: &'static str) {
        if self.inner.take().is_some() {
            debug!(reason, forwarded = self.forwarded, "released upstream stream");
        }
    }
}

impl Stream for ControlledStream {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        this.state.waker.register(cx.waker());
        if this.state.cancelled.load(Ordering::SeqCst) {
            this.release("cancelled");
            return Poll::Ready(None);
        }

        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };

        match inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.forwarded += 1;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                // Committed: no retry, nothing after the first error.
                this.release("upstream error");
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.inner = None;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for ControlledStream {
    fn drop(&mut self) {
        self.release("dropped before completion");
    }
}

impl fmt::Debug for ControlledStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlledStream")
            .field("open", &self.inner.is_some())
            .field("forwarded", &self.forwarded)
            .finish()
    }
}
