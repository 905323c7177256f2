//! Worldline Domain - core types shared by every dashboard page.
//!
//! - `identity`: the active principal and its role claims
//! - `access`: the single place where role requirements are evaluated
//! - `records`: dashboard records (customers, experiments, D-Mails, readings)
//!   and the `SyncRecord` contract live collections rely on

pub mod access;
pub mod error;
pub mod identity;
pub mod records;

pub use access::{decide, AccessDecision, AccessReason};
pub use error::DomainError;
pub use identity::{Identity, IdentityFingerprint, Role};
pub use records::{
    Customer, DMail, Experiment, ExperimentStatus, RecordId, SyncRecord, WorldlineReading,
};
