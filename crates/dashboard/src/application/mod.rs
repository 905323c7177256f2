//! Application layer: the live core that pages are built from.

pub mod access;
pub mod services;
pub mod streaming;
pub mod sync;
