use super::error::ServerError;
use super::routes;
use super::state::AppState;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{error, info, warn};

/// Builds the application router over `state`.
pub fn router(state: AppState) -> Router {
    let app = Router::new()
        .route("/health", get(routes::health::health_handler))
        .route("/api/chat", post(routes::chat::chat_handler))
        .route("/api/summarize", post(routes::study::summarize_handler))
        .route("/api/flashcards", post(routes::study::flashcards_handler))
        .route("/api/quiz", post(routes::study::quiz_handler));

    let app = match cors_layer(&state.config().cors_origins) {
        Some(cors) => app.layer(cors),
        None => app,
    };
    app.with_state(state)
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }

    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return Some(base.allow_origin(Any));
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    Some(base.allow_origin(AllowOrigin::list(allowed)))
}

/// Serves the router on an already bound listener until ctrl-c.
pub async fn serve_on(listener: TcpListener, state: AppState) -> Result<(), ServerError> {
    let app = router(state);
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "study gateway ready to accept connections");
    }

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            error!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
