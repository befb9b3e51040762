//! 流水线处理模块：把上游 SSE 字节流解码为文本增量。
//!
//! # Streaming Pipeline
//!
//! Turns the raw byte stream of a streamed upstream reply into the
//! [`TextStream`] the policy relays to clients.
//!
//! ```text
//! Raw Bytes → SseDecoder → DeltaExtractor → TextStream
//!     │            │              │
//!   HTTP       SSE framing   choices[0].delta.content
//! ```
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`decode`] | SSE frame decoder |
//! | [`event_map`] | JSON path extraction of text deltas |

pub mod decode;
pub mod event_map;

use crate::{BoxStream, TextStream};
use bytes::Bytes;

/// Decodes an OpenAI-compatible SSE body into text deltas.
pub fn text_stream(body: BoxStream<'static, Bytes>) -> TextStream {
    let frames = decode::SseDecoder::default().decode_stream(body);
    event_map::DeltaExtractor::default().map_stream(frames)
}
