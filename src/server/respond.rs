//! Policy outcome → HTTP response.

use super::dto::ContentResponse;
use super::error::ApiError;
use crate::policy::CallOutcome;
use axum::body::Body;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use futures::{future, StreamExt};
use std::convert::Infallible;
use tracing::warn;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub(crate) fn respond(outcome: CallOutcome, request_id: &str) -> Response {
    let mut response = match outcome {
        CallOutcome::StreamedSuccess(stream) => {
            let id = request_id.to_string();
            // Status is already sent once chunks flow; a late upstream error
            // can only end the body early.
            let body = stream.filter_map(move |item| {
                future::ready(match item {
                    Ok(chunk) => Some(Ok::<_, Infallible>(Bytes::from(chunk))),
                    Err(e) => {
                        warn!(request_id = %id, error = %e, "upstream stream broke after commit");
                        None
                    }
                })
            });
            (
                StatusCode::OK,
                [
                    (CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8")),
                    (CACHE_CONTROL, HeaderValue::from_static("no-cache")),
                ],
                Body::from_stream(body),
            )
                .into_response()
        }
        CallOutcome::BufferedSuccess(content) => {
            (StatusCode::OK, Json(ContentResponse { content })).into_response()
        }
        CallOutcome::Failure(failure) => ApiError::from(failure).into_response(),
    };

    if let Ok(value) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
