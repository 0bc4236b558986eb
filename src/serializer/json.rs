//! Strict JSON serializer.

use hyper::body::Bytes;
use serde_json::Value;

use crate::serializer::{JSON_CONTENT_TYPE, Serializer, SerializerError};

/// Encodes every value as JSON and requires JSON back.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSerializer;

impl JsonSerializer {
    pub fn new() -> Self {
        Self
    }
}

impl Serializer for JsonSerializer {
    fn serialize(&self, value: &Value) -> Result<(Bytes, &'static str), SerializerError> {
        let bytes = serde_json::to_vec(value).map_err(|e| SerializerError::Encode(e.to_string()))?;
        Ok((Bytes::from(bytes), JSON_CONTENT_TYPE))
    }

    fn deserialize(&self, body: &[u8], _content_type: Option<&str>) -> Result<Value, SerializerError> {
        if body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(body).map_err(|e| SerializerError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_serializer() {
        let s = JsonSerializer::new();
        let (bytes, ct) = s.serialize(&json!({"query": {"match_all": {}}})).unwrap();
        assert_eq!(ct, "application/json");
        assert_eq!(&bytes[..], br#"{"query":{"match_all":{}}}"#);

        assert_eq!(s.deserialize(b"", None).unwrap(), Value::Null);
        assert_eq!(s.deserialize(br#"{"ok":true}"#, None).unwrap(), json!({"ok": true}));
        assert!(matches!(
            s.deserialize(b"<html>", Some("text/html")),
            Err(SerializerError::Decode(_))
        ));
    }
}
