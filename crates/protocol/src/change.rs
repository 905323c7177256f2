//! Create/update/delete changes carried by inbound events.

use serde_json::{Map, Value};
use worldline_domain::RecordId;

use crate::inbound::{EventKind, InboundEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

impl ChangeKind {
    pub fn from_event_kind(kind: EventKind) -> Option<Self> {
        match kind {
            EventKind::DomainCreate => Some(ChangeKind::Create),
            EventKind::DomainUpdate => Some(ChangeKind::Update),
            EventKind::DomainDelete => Some(ChangeKind::Delete),
            EventKind::ChatText | EventKind::Unrecognized => None,
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            ChangeKind::Create => "created",
            ChangeKind::Update => "updated",
            ChangeKind::Delete => "deleted",
        }
    }
}

/// A domain mutation in canonical form.
///
/// `record` always contains the `id` field, whether the frame carried the
/// record under `data` or flat at the top level.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainChange {
    pub kind: ChangeKind,
    pub id: RecordId,
    pub record: Value,
    pub actor: Option<String>,
}

impl InboundEvent {
    /// Extract the domain change, if this event is one and names a record.
    ///
    /// Returns `None` for chat/unrecognized events and for domain events with
    /// no usable identifier.
    pub fn domain_change(&self) -> Option<DomainChange> {
        let kind = ChangeKind::from_event_kind(self.kind)?;
        let object = self.payload.as_object()?;

        let mut record = match object.get("data") {
            Some(Value::Object(data)) => data.clone(),
            _ => flat_record(object),
        };

        let id = record
            .get("id")
            .or_else(|| object.get("id"))
            .and_then(record_id_of)?;
        record.insert("id".to_string(), Value::String(id.to_string()));

        Some(DomainChange {
            kind,
            id,
            record: Value::Object(record),
            actor: self.actor.clone(),
        })
    }
}

fn flat_record(object: &Map<String, Value>) -> Map<String, Value> {
    object
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "type" | "actor"))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn record_id_of(value: &Value) -> Option<RecordId> {
    match value {
        Value::String(text) => RecordId::parse(text.as_str()).ok(),
        Value::Number(number) => RecordId::parse(number.to_string()).ok(),
        _ => None,
    }
}
