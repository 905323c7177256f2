//! Worldline Protocol - the streaming wire format spoken with the dashboard backend
//!
//! - `frames`: client to server frames (authentication, outbound payloads)
//! - `inbound`: normalization of every server frame into one `InboundEvent` shape
//! - `change`: extraction of create/update/delete changes from inbound events
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - only serde, serde_json, chrono and the domain ids
//! 2. **No business logic** - pure data types and shape normalization
//! 3. **One canonical shape** - wrapped and direct server payloads are unified
//!    here so no consumer ever branches on wire shape

pub mod change;
pub mod frames;
pub mod inbound;

pub use change::{ChangeKind, DomainChange};
pub use frames::{authenticate_frame, ClientFrame, OutboundPayload, DEFAULT_MESSAGE_TYPE};
pub use inbound::{normalize, EventKind, EventPayload, InboundEvent, Origin, DEFAULT_ECHO_MARKER};
