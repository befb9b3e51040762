//! Provider 抽象层：上游模型服务的统一调用接口
//!
//! Provider abstraction. The policy only needs two operations from an upstream:
//! a buffered completion and a streamed completion. Anything implementing
//! [`Provider`] can sit behind [`crate::UpstreamCallPolicy::execute`], which is
//! also how tests substitute a scripted upstream.

pub mod openai;

use crate::{CallRequest, Result, TextStream};
use async_trait::async_trait;

pub use openai::OpenAiProvider;

/// One upstream model service.
///
/// Implementations perform exactly one upstream call per method invocation
/// and never retry internally.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short identifier used in logs.
    fn id(&self) -> &str;

    /// Buffered call: the whole reply text at once.
    async fn complete(&self, request: &CallRequest) -> Result<String>;

    /// Streamed call: text deltas as they arrive.
    ///
    /// Errors that happen before the stream is returned (connection, status)
    /// are returned directly; later ones are stream items.
    async fn stream(&self, request: &CallRequest) -> Result<TextStream>;
}
