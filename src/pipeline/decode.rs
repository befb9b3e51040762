//! Streaming decoder (Bytes -> JSON Value)
//!
//! Decodes the server-sent-events framing used by OpenAI-compatible
//! `chat/completions` streams. Provider-specific field extraction lives in
//! [`super::event_map`].

use crate::BoxStream;
use bytes::Bytes;
use futures::{stream, StreamExt};
use serde_json::Value;
use tracing::debug;

const DATA_FIELD: &str = "data:";
const DONE_SIGNAL: &str = "[DONE]";

/// A minimal SSE decoder:
/// - splits frames on a blank line (`\n\n` or `\r\n\r\n`)
/// - strips the `data:` field name
/// - stops on `data: [DONE]`
///
/// Bytes are buffered until a frame is complete, so characters and
/// delimiters split across network chunks survive intact.
#[derive(Debug, Clone, Copy, Default)]
pub struct SseDecoder;

/// Earliest frame boundary in `buf`: (frame end, delimiter length).
fn find_boundary(buf: &[u8]) -> Option<(usize, usize)> {
    let lf = find(buf, b"\n\n").map(|idx| (idx, 2));
    let crlf = find(buf, b"\r\n\r\n").map(|idx| (idx, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if b.0 < a.0 { b } else { a }),
        (a, b) => a.or(b),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

impl SseDecoder {
    fn is_done(frame: &str) -> bool {
        let t = frame.trim();
        t == DONE_SIGNAL
            || t.strip_prefix(DATA_FIELD)
                .map(|rest| rest.trim() == DONE_SIGNAL)
                .unwrap_or(false)
    }

    /// Parses one frame. Comments, blank frames and non-JSON payloads yield `None`.
    fn parse_frame(frame: &str) -> Option<Value> {
        let mut payload = String::new();
        for line in frame.lines() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() || line.starts_with(':') {
                continue;
            }
            let data = if let Some(rest) = line.strip_prefix(DATA_FIELD) {
                rest.strip_prefix(' ').unwrap_or(rest)
            } else if line.starts_with("event:") || line.starts_with("id:") || line.starts_with("retry:") {
                continue;
            } else {
                line
            };
            if !payload.is_empty() {
                payload.push('\n');
            }
            payload.push_str(data);
        }

        let trimmed = payload.trim();
        if trimmed.is_empty() {
            return None;
        }
        match serde_json::from_str(trimmed) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!(error = %e, "skipping non-JSON SSE frame");
                None
            }
        }
    }

    /// `Some(Some(frame))` to emit, `Some(None)` to skip, `None` at the done signal.
    fn handle_frame(raw: &[u8]) -> Option<Option<Value>> {
        let frame = match std::str::from_utf8(raw) {
            Ok(frame) => frame,
            Err(e) => {
                debug!(error = %e, "skipping SSE frame with invalid UTF-8");
                return Some(None);
            }
        };
        if Self::is_done(frame) {
            return None;
        }
        Some(Self::parse_frame(frame))
    }

    /// Turns a byte stream into a stream of decoded JSON frames.
    ///
    /// Transport errors are forwarded as-is; the stream ends at the done
    /// signal or when the input ends.
    pub fn decode_stream(&self, input: BoxStream<'static, Bytes>) -> BoxStream<'static, Value> {
        let stream = stream::unfold(Some((input, Vec::<u8>::new())), |state| async move {
            let (mut input, mut buf) = state?;
            loop {
                if let Some((idx, len)) = find_boundary(&buf) {
                    let frame: Vec<u8> = buf.drain(..idx + len).take(idx).collect();
                    match Self::handle_frame(&frame)? {
                        Some(v) => return Some((Ok(v), Some((input, buf)))),
                        None => continue,
                    }
                }

                match input.next().await {
                    Some(Ok(bytes)) => buf.extend_from_slice(&bytes),
                    Some(Err(e)) => {
                        // Nothing after a transport error is trustworthy.
                        return Some((Err(e), None));
                    }
                    None => {
                        // EOF: the remaining bytes are one last frame
                        return Self::handle_frame(&buf)?.map(|v| (Ok(v), None));
                    }
                }
            }
        });

        Box::pin(stream)
    }
}
