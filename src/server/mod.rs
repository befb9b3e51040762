//! HTTP 服务层：axum 路由与策略结果到 HTTP 响应的转换。
//!
//! HTTP surface of the gateway.
//!
//! | Route | Task | Default delivery |
//! |-------|------|------------------|
//! | `POST /api/chat` | tutoring conversation | streamed, buffered fallback |
//! | `POST /api/summarize` | summary of study material | buffered |
//! | `POST /api/flashcards` | `count` flashcards (default 10) | buffered |
//! | `POST /api/quiz` | `count` quiz questions (default 5) | buffered |
//! | `GET /health` | liveness | |
//!
//! Success is either a `text/plain` stream or `{"content": ...}`; failures are
//! `{"error": ...}` with the status of the classified [`crate::ErrorKind`].
//! Setting `"stream"` in the body overrides a route's default delivery.

mod dto;
mod error;
mod respond;
mod router;
mod routes;
mod state;

pub use dto::{ContentResponse, ErrorResponse, HealthResponse, StudyRequest};
pub use error::{ApiError, ServerError};
pub use respond::REQUEST_ID_HEADER;
pub use router::{router, serve_on};
pub use state::AppState;

use crate::config::GatewayConfig;
use crate::provider::Provider;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Binds `config.bind` and serves until ctrl-c.
pub async fn serve(config: Arc<GatewayConfig>, provider: Arc<dyn Provider>) -> Result<(), ServerError> {
    let addr = config.bind;
    info!(%addr, provider = provider.id(), model = %config.model, "binding study gateway");

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    serve_on(listener, AppState::new(config, provider)).await
}
