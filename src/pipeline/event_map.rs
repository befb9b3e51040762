//! Event mapping (JSON Value -> text delta)
//!
//! Pulls the generated text out of decoded frames using dot-notation paths
//! with array indexing (e.g. `choices[0].delta.content`).

use crate::{BoxStream, Error, TextStream};
use futures::StreamExt;
use serde_json::Value;

/// Delta path of OpenAI-compatible streaming frames.
pub const STREAM_CONTENT_PATH: &str = "choices[0].delta.content";
/// Message path of OpenAI-compatible buffered replies.
pub const MESSAGE_CONTENT_PATH: &str = "choices[0].message.content";

/// Get value from JSON using dot-notation path (supports array indexing)
///
/// Examples:
/// - "choices[0].delta.content"
/// - "choices.0.message.content"
/// - "error.message"
pub fn get_path<'a>(obj: &'a Value, path: &str) -> Option<&'a Value> {
    let normalized = path.trim().trim_start_matches("$.");
    if normalized.is_empty() {
        return None;
    }

    let mut current = obj;
    for part in normalized.split('.') {
        if part.is_empty() {
            return None;
        }

        let (key, index) = match part.find('[') {
            Some(pos) => {
                let idx = part[pos + 1..].trim_end_matches(']').parse::<usize>().ok()?;
                (&part[..pos], Some(idx))
            }
            None => (part, None),
        };

        if !key.is_empty() {
            current = match current {
                Value::Object(map) => map.get(key)?,
                // dot-index access, e.g. "choices.0.delta"
                Value::Array(arr) => arr.get(key.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        if let Some(idx) = index {
            current = current.as_array()?.get(idx)?;
        }
    }

    Some(current)
}

/// Error payload an upstream may embed in an otherwise successful body or frame.
pub fn embedded_error(frame: &Value) -> Option<String> {
    let err = frame.get("error")?;
    if err.is_null() {
        return None;
    }
    Some(
        get_path(err, "message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string()),
    )
}

/// Maps decoded frames to their text deltas at [`STREAM_CONTENT_PATH`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DeltaExtractor;

impl DeltaExtractor {
    /// Frames without text (role headers, finish markers, empty deltas) are
    /// skipped. An embedded error frame becomes an `InvalidResponse` item.
    pub fn map_stream(&self, frames: BoxStream<'static, Value>) -> TextStream {
        let mapped = frames.filter_map(|item| {
            let out = match item {
                Err(e) => Some(Err(e)),
                Ok(frame) => match embedded_error(&frame) {
                    Some(message) => Some(Err(Error::invalid_response("sse_stream", message))),
                    None => get_path(&frame, STREAM_CONTENT_PATH)
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty())
                        .map(|s| Ok(s.to_string())),
                },
            };
            futures::future::ready(out)
        });
        Box::pin(mapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use serde_json::json;

    #[test]
    fn paths_with_indices() {
        let v = json!({"choices": [{"delta": {"content": "Hi"}}]});
        assert_eq!(get_path(&v, STREAM_CONTENT_PATH), Some(&json!("Hi")));
        assert_eq!(get_path(&v, "choices.0.delta.content"), Some(&json!("Hi")));
        assert_eq!(get_path(&v, "$.choices[0].delta"), Some(&json!({"content": "Hi"})));
        assert_eq!(get_path(&v, "choices[1].delta"), None);
        assert_eq!(get_path(&v, ""), None);
        assert_eq!(get_path(&v, "choices..delta"), None);
    }

    #[test]
    fn embedded_errors_are_detected() {
        assert_eq!(
            embedded_error(&json!({"error": {"message": "overloaded"}})).as_deref(),
            Some("overloaded")
        );
        assert_eq!(embedded_error(&json!({"error": null})), None);
        assert_eq!(embedded_error(&json!({"choices": []})), None);
    }

    #[tokio::test]
    async fn deltas_skip_empty_frames() {
        let frames: BoxStream<'static, Value> = Box::pin(stream::iter(vec![
            Ok(json!({"choices": [{"delta": {"role": "assistant"}}]})),
            Ok(json!({"choices": [{"delta": {"content": "Photo"}}]})),
            Ok(json!({"choices": [{"delta": {"content": ""}}]})),
            Ok(json!({"choices": [{"delta": {"content": "synthesis"}}]})),
            Ok(json!({"choices": [{"delta": {}, "finish_reason": "stop"}]})),
        ]));
        let text: Vec<String> = DeltaExtractor::default()
            .map_stream(frames)
            .map(|r| r.expect("delta"))
            .collect()
            .await;
        assert_eq!(text, vec!["Photo".to_string(), "synthesis".to_string()]);
    }

    #[tokio::test]
    async fn error_frame_becomes_stream_error() {
        let frames: BoxStream<'static, Value> = Box::pin(stream::iter(vec![Ok(
            json!({"error": {"message": "server overloaded"}}),
        )]));
        let items: Vec<_> = DeltaExtractor::default().map_stream(frames).collect().await;
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(Error::InvalidResponse { .. })));
    }
}
