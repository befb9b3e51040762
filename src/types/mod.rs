//! 类型模块：消息与上游调用请求。
//!
//! # Types Module
//!
//! Core data types shared by the policy, the provider client and the HTTP routes.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Message`] | Role-tagged chat message |
//! | [`MessageRole`] | `system`, `user` or `assistant` |
//! | [`CallRequest`] | Model id + messages + generation parameters for one upstream call |
//! | [`GenerationParams`] | Optional temperature / output token limit |
//!
//! ## Example
//!
//! ```rust
//! use study_ai_gateway::types::{CallRequest, Message};
//!
//! let request = CallRequest::new(
//!     "gpt-4o-mini",
//!     vec![Message::system("You are a tutor."), Message::user("Explain osmosis.")],
//! );
//! assert!(request.validate().is_ok());
//! ```

pub mod message;
pub mod request;

pub use message::{Message, MessageRole};
pub use request::{CallRequest, GenerationParams};
