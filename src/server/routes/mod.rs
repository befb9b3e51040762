//! Route adapters. Each AI route only picks its task, its default delivery
//! and whether the streaming fallback applies; the rest is shared.

pub mod chat;
pub mod health;
pub mod study;

use super::dto::StudyRequest;
use super::error::ApiError;
use super::respond::respond;
use super::state::AppState;
use crate::policy::CallMode;
use crate::prompts::StudyTask;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Per-route delivery defaults.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RouteProfile {
    pub default_mode: CallMode,
    pub stream_fallback: bool,
}

pub(crate) async fn run_task(
    state: AppState,
    task: StudyTask,
    profile: RouteProfile,
    payload: Result<Json<StudyRequest>, JsonRejection>,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let span = info_span!("study_request", request_id = %request_id, task = task.name());

    async move {
        let Json(body) = match payload {
            Ok(body) => body,
            Err(rejection) => {
                warn!(error = %rejection.body_text(), "rejecting malformed body");
                let mut response = ApiError::from(rejection).into_response();
                if let Ok(value) = request_id.parse() {
                    response
                        .headers_mut()
                        .insert(super::respond::REQUEST_ID_HEADER, value);
                }
                return response;
            }
        };

        let mode = match body.stream {
            Some(true) => CallMode::Streamed,
            Some(false) => CallMode::Buffered,
            None => profile.default_mode,
        };
        info!(
            mode = ?mode,
            messages = body.messages.len(),
            has_message = body.message.is_some(),
            "received request"
        );

        let call = body.to_call(&state.config().model, task);
        let policy = state.policy().with_stream_fallback(profile.stream_fallback);
        let outcome = policy.execute(state.provider(), &call, mode).await;
        respond(outcome, &request_id)
    }
    .instrument(span)
    .await
}
