//! Client to server frames.

use serde::Serialize;
use serde_json::{Map, Value};

/// `type` assigned to structured outbound payloads that do not name one.
pub const DEFAULT_MESSAGE_TYPE: &str = "message";

/// Control frames the client originates itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// First frame on every freshly opened transport.
    Authenticate { token: String },
}

pub fn authenticate_frame(token: &str) -> Result<String, serde_json::Error> {
    serde_json::to_string(&ClientFrame::Authenticate {
        token: token.to_string(),
    })
}

/// Anything a page may hand to the streaming client for sending.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundPayload {
    /// Sent verbatim.
    Text(String),
    /// Serialized as JSON after `type` defaults to `"message"`.
    Object(Map<String, Value>),
    /// Any other JSON value; sent in its textual form.
    Other(Value),
}

impl OutboundPayload {
    pub fn encode(self) -> Result<String, serde_json::Error> {
        match self {
            OutboundPayload::Text(text) => Ok(text),
            OutboundPayload::Object(mut object) => {
                if !object.contains_key("type") {
                    object.insert(
                        "type".to_string(),
                        Value::String(DEFAULT_MESSAGE_TYPE.to_string()),
                    );
                }
                serde_json::to_string(&object)
            }
            OutboundPayload::Other(value) => Ok(value.to_string()),
        }
    }
}

impl From<String> for OutboundPayload {
    fn from(value: String) -> Self {
        OutboundPayload::Text(value)
    }
}

impl From<&str> for OutboundPayload {
    fn from(value: &str) -> Self {
        OutboundPayload::Text(value.to_string())
    }
}

impl From<Map<String, Value>> for OutboundPayload {
    fn from(value: Map<String, Value>) -> Self {
        OutboundPayload::Object(value)
    }
}

impl From<Value> for OutboundPayload {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => OutboundPayload::Text(text),
            Value::Object(object) => OutboundPayload::Object(object),
            other => OutboundPayload::Other(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn authenticate_frame_matches_wire_shape() {
        let frame: Value = serde_json::from_str(&authenticate_frame("abc").unwrap()).unwrap();
        assert_eq!(frame, json!({"type": "authenticate", "token": "abc"}));
    }

    #[test]
    fn strings_are_sent_verbatim() {
        let encoded = OutboundPayload::from(json!("hello {not json")).encode().unwrap();
        assert_eq!(encoded, "hello {not json");
    }

    #[test]
    fn objects_default_to_message_type() {
        let encoded = OutboundPayload::from(json!({"content": "hi"})).encode().unwrap();
        let value: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value, json!({"type": "message", "content": "hi"}));
    }

    #[test]
    fn explicit_type_is_preserved() {
        let encoded = OutboundPayload::from(json!({"type": "update", "id": "X-1"}))
            .encode()
            .unwrap();
        let value: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["type"], "update");
    }

    #[test]
    fn other_values_are_stringified() {
        assert_eq!(OutboundPayload::from(json!(42)).encode().unwrap(), "42");
        assert_eq!(OutboundPayload::from(json!(true)).encode().unwrap(), "true");
        assert_eq!(OutboundPayload::from(json!([1, 2])).encode().unwrap(), "[1,2]");
    }
}
