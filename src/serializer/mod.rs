//! Payload serialization.
//!
//! # Data Flow
//! ```text
//! Request body (serde_json::Value)
//!     → Serializer::serialize → Bytes + content type
//!     → Connection
//! RawResponse body (Bytes + content type)
//!     → Serializer::deserialize → serde_json::Value
//! ```
//!
//! # Design Decisions
//! - Serializers are stateless and swapped wholesale
//! - An empty response body always decodes to `Value::Null`

pub mod json;
pub mod smart;

use hyper::body::Bytes;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

pub use json::JsonSerializer;
pub use smart::SmartSerializer;

pub const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Error)]
pub enum SerializerError {
    #[error("failed to encode body: {0}")]
    Encode(String),

    #[error("failed to decode body: {0}")]
    Decode(String),
}

/// Value-level encode/decode between application payloads and wire bytes.
pub trait Serializer: Send + Sync + fmt::Debug {
    /// Encode a body. Returns the bytes and the content type to send.
    fn serialize(&self, value: &Value) -> Result<(Bytes, &'static str), SerializerError>;

    /// Decode a response body.
    fn deserialize(&self, body: &[u8], content_type: Option<&str>) -> Result<Value, SerializerError>;
}
