//! 传输层：与上游模型服务的 HTTP 通信。
//!
//! A single pooled `reqwest` client per provider. Non-success statuses are
//! turned into [`crate::Error::Remote`] here so the policy can classify them.

pub mod http;

pub use http::{HttpTransport, TransportError};
