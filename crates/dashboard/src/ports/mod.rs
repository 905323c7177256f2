//! Dashboard port definitions.
//!
//! Every collaborator the live core depends on is a trait here, injected at
//! construction time. Adapters live in `crate::infrastructure`.

pub mod outbound;
