//! Server to client frames.
//!
//! The backend is not schema-enforced: frames may be plain text, a direct JSON
//! object (`{"type":..,"data":..}` or flat `{"type":..,"id":..}`) or the same
//! object wrapped in `{"rawData": ..}`. `normalize` turns all of them into a
//! single `InboundEvent` and never fails.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// Substring the backend includes when it echoes a frame back to its sender.
pub const DEFAULT_ECHO_MARKER: &str = "[echo]";

const WRAPPER_KEY: &str = "rawData";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    DomainCreate,
    DomainUpdate,
    DomainDelete,
    ChatText,
    Unrecognized,
}

impl EventKind {
    pub fn is_domain(self) -> bool {
        matches!(
            self,
            EventKind::DomainCreate | EventKind::DomainUpdate | EventKind::DomainDelete
        )
    }
}

/// Whether a frame is the backend acknowledging our own send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Peer,
    SelfEcho,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// Decoded JSON, already unwrapped from any `rawData` envelope.
    Structured(Value),
    /// The frame was not JSON.
    Raw(String),
}

impl EventPayload {
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            EventPayload::Structured(Value::Object(object)) => Some(object),
            _ => None,
        }
    }
}

/// One normalized server frame.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub kind: EventKind,
    pub payload: EventPayload,
    /// Who caused the event, when the frame says so.
    pub actor: Option<String>,
    pub received_at: DateTime<Utc>,
    /// Rendering suitable for chat-style views.
    pub text: String,
    pub origin: Origin,
}

impl InboundEvent {
    pub fn is_self_echo(&self) -> bool {
        self.origin == Origin::SelfEcho
    }

    /// The `type` field of a structured payload.
    pub fn wire_type(&self) -> Option<&str> {
        self.payload.as_object()?.get("type")?.as_str()
    }
}

/// Normalize one raw transport frame.
pub fn normalize(raw: &str, echo_marker: &str, received_at: DateTime<Utc>) -> InboundEvent {
    let decoded = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(object)) => unwrap_envelope(object),
        _ => {
            return InboundEvent {
                kind: EventKind::Unrecognized,
                payload: EventPayload::Raw(raw.to_string()),
                actor: None,
                received_at,
                origin: origin_of(raw, echo_marker),
                text: raw.to_string(),
            };
        }
    };

    let wire_type = decoded
        .get("type")
        .and_then(Value::as_str)
        .map(str::to_string);
    let body = content_or_restringified(&decoded);

    let (kind, text) = match wire_type.as_deref() {
        Some("message") => (EventKind::ChatText, body),
        Some(other) => {
            let kind = match other {
                "create" => EventKind::DomainCreate,
                "update" => EventKind::DomainUpdate,
                "delete" => EventKind::DomainDelete,
                _ => EventKind::Unrecognized,
            };
            (kind, format!("[{other}] {body}"))
        }
        None => (EventKind::Unrecognized, body),
    };

    InboundEvent {
        kind,
        actor: actor_of(&decoded),
        origin: origin_of(&text, echo_marker),
        payload: EventPayload::Structured(Value::Object(decoded)),
        received_at,
        text,
    }
}

/// `{"rawData": {...}}` becomes its inner object. An actor named only on the
/// envelope is carried over.
fn unwrap_envelope(mut object: Map<String, Value>) -> Map<String, Value> {
    match object.remove(WRAPPER_KEY) {
        Some(Value::Object(mut inner)) => {
            if !inner.contains_key("actor") {
                if let Some(actor) = object.remove("actor") {
                    inner.insert("actor".to_string(), actor);
                }
            }
            inner
        }
        Some(other) => {
            object.insert(WRAPPER_KEY.to_string(), other);
            object
        }
        None => object,
    }
}

fn content_or_restringified(object: &Map<String, Value>) -> String {
    match object.get("content") {
        Some(Value::String(content)) => content.clone(),
        Some(Value::Null) | None => Value::Object(object.clone()).to_string(),
        Some(other) => other.to_string(),
    }
}

fn actor_of(object: &Map<String, Value>) -> Option<String> {
    object
        .get("actor")
        .or_else(|| object.get("data").and_then(|data| data.get("actor")))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|actor| !actor.is_empty())
        .map(str::to_string)
}

fn origin_of(text: &str, echo_marker: &str) -> Origin {
    if !echo_marker.is_empty() && text.contains(echo_marker) {
        Origin::SelfEcho
    } else {
        Origin::Peer
    }
}
