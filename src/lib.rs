//! # study-ai-gateway
//!
//! 学习助手 AI 网关：所有上游模型调用共用一套重试、退避与回退策略。
//!
//! HTTP gateway for an AI study assistant. Every AI-backed route (chat,
//! summaries, flashcards, quizzes) is a thin adapter that shapes a request and
//! hands it to a single [`UpstreamCallPolicy`], which owns retry, exponential
//! backoff, streaming/buffered fallback and error classification.
//!
//! ## Overview
//!
//! - **One policy**: bounded attempts, `base * 2^attempt` backoff, non-blocking waits
//! - **Streaming-first**: chunks are relayed as they arrive; a committed stream is never restarted
//! - **No raw upstream errors**: every failure is classified into an [`ErrorKind`] with a fixed
//!   user-visible message and HTTP status
//! - **Configuration resolved once**: [`GatewayConfig`] is loaded at startup and injected
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`policy`] | Upstream call policy, outcomes, cancellation |
//! | [`provider`] | Provider trait and the OpenAI-compatible client |
//! | [`transport`] | HTTP transport to the upstream provider |
//! | [`pipeline`] | SSE decoding and delta extraction |
//! | [`server`] | axum router, route adapters, HTTP responder |
//! | [`prompts`] | Per-route system prompts |
//! | [`error_code`] | Failure kinds, HTTP statuses, user-visible messages |
//! | [`config`] | Startup configuration |
//! | [`types`] | Messages and call requests |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use study_ai_gateway::{GatewayConfig, OpenAiProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(GatewayConfig::load(None)?);
//!     let provider = Arc::new(OpenAiProvider::new(&config)?);
//!     study_ai_gateway::server::serve(config, provider).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error_code;
pub mod pipeline;
pub mod policy;
pub mod prompts;
pub mod provider;
pub mod server;
pub mod transport;
pub mod types;

pub use config::{ConfigError, GatewayConfig, RetrySettings};
pub use error_code::ErrorKind;
pub use policy::{
    CallMode, CallOutcome, CancelHandle, ControlledStream, Delivery, Failure, UpstreamCallPolicy,
};
pub use provider::{OpenAiProvider, Provider};
pub use types::{CallRequest, GenerationParams, Message, MessageRole};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `Result<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// Incremental text produced by a streamed upstream call.
pub type TextStream = BoxStream<'static, String>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
