//! Collection reconciliation for live pages.

mod actor;
mod collection;
mod collection_sync;

pub use actor::{format_actor, UNKNOWN_ACTOR};
pub use collection::{EditBuffer, TrackedCollection};
pub use collection_sync::{CollectionSync, IgnoreReason, SyncChange};

pub(crate) use collection_sync::entity_title;
