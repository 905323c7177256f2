//! Applies streamed create/update/delete events to a page's collection.

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;
use worldline_domain::{Identity, RecordId, SyncRecord};
use worldline_protocol::{ChangeKind, DomainChange, InboundEvent};

use super::actor::format_actor;
use super::collection::{EditBuffer, TrackedCollection};
use crate::ports::outbound::{Notification, Notifier};

/// Why an event left the collection untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Chat or unrecognized frame.
    NotDomain,
    /// Domain frame with no usable identifier.
    MissingId,
    /// The record did not decode into the collection's type.
    Malformed,
    /// Create for an id that is already present.
    Duplicate,
    /// Update or delete for an id that is not present.
    UnknownRecord,
}

/// What `apply_event` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncChange {
    Inserted { id: RecordId, index: usize },
    Replaced { id: RecordId, index: usize },
    Removed { id: RecordId, index: usize },
    Ignored(IgnoreReason),
}

impl SyncChange {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, SyncChange::Ignored(_))
    }
}

/// Reconciliation policy for one entity collection.
pub struct CollectionSync<T> {
    notifier: Arc<dyn Notifier>,
    _record: PhantomData<fn() -> T>,
}

impl<T: SyncRecord> CollectionSync<T> {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            _record: PhantomData,
        }
    }

    /// Apply one inbound event. Never panics; malformed events are ignored.
    ///
    /// At most one notification is issued, and none when the event was caused
    /// by `current` (or is the backend echoing our own send). The edit buffer
    /// is refreshed or closed regardless of who caused the change.
    pub fn apply_event(
        &self,
        event: &InboundEvent,
        collection: &mut TrackedCollection<T>,
        edit_buffer: &mut EditBuffer<T>,
        current: Option<&Identity>,
    ) -> SyncChange {
        let Some(change) = domain_change::<T>(event) else {
            return ignored_reason(event);
        };

        let own = event.is_self_echo()
            || match (current, change.actor.as_deref()) {
                (Some(identity), Some(actor)) => identity.is_actor(actor),
                _ => false,
            };

        self.apply_change(change, collection, edit_buffer, own)
    }

    /// Re-apply an event that was already applied (and announced) once, for
    /// example on top of a fresh REST snapshot. Touches only the collection
    /// and never notifies.
    pub fn replay_event(&self, event: &InboundEvent, collection: &mut TrackedCollection<T>) -> SyncChange {
        let Some(change) = domain_change::<T>(event) else {
            return ignored_reason(event);
        };
        self.apply_change(change, collection, &mut EditBuffer::new(), true)
    }

    fn apply_change(
        &self,
        change: DomainChange,
        collection: &mut TrackedCollection<T>,
        edit_buffer: &mut EditBuffer<T>,
        own: bool,
    ) -> SyncChange {
        match change.kind {
            ChangeKind::Create => self.apply_create(change, collection, own),
            ChangeKind::Update => self.apply_update(change, collection, edit_buffer, own),
            ChangeKind::Delete => self.apply_delete(change, collection, edit_buffer, own),
        }
    }

    fn apply_create(
        &self,
        change: DomainChange,
        collection: &mut TrackedCollection<T>,
        own: bool,
    ) -> SyncChange {
        if collection.contains(&change.id) {
            return SyncChange::Ignored(IgnoreReason::Duplicate);
        }
        let Some(record) = decode::<T>(change.record) else {
            return SyncChange::Ignored(IgnoreReason::Malformed);
        };
        let name = record.display_name();
        let Some(index) = collection.insert(record) else {
            return SyncChange::Ignored(IgnoreReason::Duplicate);
        };

        if !own {
            self.notifier.notify(Notification::info(format!(
                "New {} \"{}\" created by {}",
                T::ENTITY,
                name,
                format_actor(change.actor.as_deref())
            )));
        }
        SyncChange::Inserted {
            id: change.id,
            index,
        }
    }

    fn apply_update(
        &self,
        change: DomainChange,
        collection: &mut TrackedCollection<T>,
        edit_buffer: &mut EditBuffer<T>,
        own: bool,
    ) -> SyncChange {
        let Some(existing) = collection.get(&change.id) else {
            return SyncChange::Ignored(IgnoreReason::UnknownRecord);
        };
        // Frames may carry only the changed fields.
        let merged = merge(existing, change.record);
        let Some(record) = decode::<T>(merged) else {
            return SyncChange::Ignored(IgnoreReason::Malformed);
        };
        let name = record.display_name();

        let conflict = edit_buffer.is_editing(&change.id);
        if conflict {
            edit_buffer.open(record.clone());
        }
        let Some(index) = collection.replace(record) else {
            return SyncChange::Ignored(IgnoreReason::UnknownRecord);
        };

        if !own {
            let actor = format_actor(change.actor.as_deref());
            let notification = if conflict {
                Notification::warning(format!(
                    "{} \"{}\" you are editing was updated by {}; the form has been refreshed",
                    entity_title::<T>(),
                    name,
                    actor
                ))
            } else {
                Notification::info(format!(
                    "{} \"{}\" updated by {}",
                    entity_title::<T>(),
                    name,
                    actor
                ))
            };
            self.notifier.notify(notification);
        }
        SyncChange::Replaced {
            id: change.id,
            index,
        }
    }

    fn apply_delete(
        &self,
        change: DomainChange,
        collection: &mut TrackedCollection<T>,
        edit_buffer: &mut EditBuffer<T>,
        own: bool,
    ) -> SyncChange {
        let Some((index, removed)) = collection.remove(&change.id) else {
            return SyncChange::Ignored(IgnoreReason::UnknownRecord);
        };
        let name = removed.display_name();

        let conflict = edit_buffer.is_editing(&change.id);
        if conflict {
            edit_buffer.close();
        }

        if !own {
            let actor = format_actor(change.actor.as_deref());
            let notification = if conflict {
                Notification::warning(format!(
                    "{} \"{}\" you are editing was deleted by {}; the form has been closed",
                    entity_title::<T>(),
                    name,
                    actor
                ))
            } else {
                Notification::info(format!(
                    "{} \"{}\" deleted by {}",
                    entity_title::<T>(),
                    name,
                    actor
                ))
            };
            self.notifier.notify(notification);
        }
        SyncChange::Removed {
            id: change.id,
            index,
        }
    }
}

fn domain_change<T: SyncRecord>(event: &InboundEvent) -> Option<DomainChange> {
    if !event.kind.is_domain() {
        return None;
    }
    let change = event.domain_change();
    if change.is_none() {
        tracing::debug!(entity = T::ENTITY, "Ignoring domain event without id");
    }
    change
}

fn ignored_reason(event: &InboundEvent) -> SyncChange {
    if event.kind.is_domain() {
        SyncChange::Ignored(IgnoreReason::MissingId)
    } else {
        SyncChange::Ignored(IgnoreReason::NotDomain)
    }
}

fn decode<T: SyncRecord>(record: Value) -> Option<T> {
    match serde_json::from_value(record) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(entity = T::ENTITY, error = %e, "Ignoring undecodable record");
            None
        }
    }
}

fn merge<T: SyncRecord>(existing: &T, incoming: Value) -> Value {
    let Ok(Value::Object(mut base)) = serde_json::to_value(existing) else {
        return incoming;
    };
    if let Value::Object(fields) = incoming {
        base.extend(fields);
        Value::Object(base)
    } else {
        incoming
    }
}

/// Entity label with its first letter upper-cased ("customer" to "Customer").
pub(crate) fn entity_title<T: SyncRecord>() -> String {
    let mut chars = T::ENTITY.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
