//! Material-processing routes: summaries, flashcards and quizzes.

use super::super::dto::StudyRequest;
use super::super::state::AppState;
use super::{run_task, RouteProfile};
use crate::policy::CallMode;
use crate::prompts::{item_count, StudyTask};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Response;
use axum::Json;

const DEFAULT_FLASHCARDS: u32 = 10;
const DEFAULT_QUIZ_QUESTIONS: u32 = 5;

const BUFFERED: RouteProfile = RouteProfile {
    default_mode: CallMode::Buffered,
    stream_fallback: false,
};

fn requested_count(payload: &Result<Json<StudyRequest>, JsonRejection>) -> Option<u32> {
    payload.as_ref().ok().and_then(|Json(body)| body.count)
}

pub async fn summarize_handler(
    State(state): State<AppState>,
    payload: Result<Json<StudyRequest>, JsonRejection>,
) -> Response {
    run_task(state, StudyTask::Summarize, BUFFERED, payload).await
}

pub async fn flashcards_handler(
    State(state): State<AppState>,
    payload: Result<Json<StudyRequest>, JsonRejection>,
) -> Response {
    let count = item_count(requested_count(&payload), DEFAULT_FLASHCARDS);
    run_task(state, StudyTask::Flashcards { count }, BUFFERED, payload).await
}

pub async fn quiz_handler(
    State(state): State<AppState>,
    payload: Result<Json<StudyRequest>, JsonRejection>,
) -> Response {
    let count = item_count(requested_count(&payload), DEFAULT_QUIZ_QUESTIONS);
    run_task(state, StudyTask::Quiz { count }, BUFFERED, payload).await
}
