//! Lenient serializer.
//!
//! String bodies are sent verbatim (newline-delimited bulk payloads are
//! prepared by the caller). Responses that are not JSON come back as
//! `Value::String` instead of failing the request.

use hyper::body::Bytes;
use serde_json::Value;

use crate::serializer::{JSON_CONTENT_TYPE, Serializer, SerializerError};

const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

#[derive(Debug, Default, Clone, Copy)]
pub struct SmartSerializer;

impl SmartSerializer {
    pub fn new() -> Self {
        Self
    }
}

impl Serializer for SmartSerializer {
    fn serialize(&self, value: &Value) -> Result<(Bytes, &'static str), SerializerError> {
        match value {
            Value::String(raw) => {
                let content_type = if raw.ends_with('\n') {
                    NDJSON_CONTENT_TYPE
                } else {
                    JSON_CONTENT_TYPE
                };
                Ok((Bytes::from(raw.clone()), content_type))
            }
            other => {
                let bytes =
                    serde_json::to_vec(other).map_err(|e| SerializerError::Encode(e.to_string()))?;
                Ok((Bytes::from(bytes), JSON_CONTENT_TYPE))
            }
        }
    }

    fn deserialize(&self, body: &[u8], content_type: Option<&str>) -> Result<Value, SerializerError> {
        if body.is_empty() {
            return Ok(Value::Null);
        }
        let looks_json = content_type.map_or(true, |ct| ct.contains("json"));
        if looks_json {
            if let Ok(value) = serde_json::from_slice(body) {
                return Ok(value);
            }
        }
        Ok(Value::String(String::from_utf8_lossy(body).into_owned()))
    }
}
