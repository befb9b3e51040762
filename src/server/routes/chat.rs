use super::super::dto::StudyRequest;
use super::super::state::AppState;
use super::{run_task, RouteProfile};
use crate::policy::CallMode;
use crate::prompts::StudyTask;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Response;
use axum::Json;

/// Tutoring chat. Streams by default and falls back to a buffered reply when
/// streaming fails.
pub async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<StudyRequest>, JsonRejection>,
) -> Response {
    let profile = RouteProfile {
        default_mode: CallMode::Streamed,
        stream_fallback: true,
    };
    run_task(state, StudyTask::Chat, profile, payload).await
}
