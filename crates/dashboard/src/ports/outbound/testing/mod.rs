//! Test utilities for outbound ports
//!
//! In-memory doubles for the collaborators that are easier to drive by hand
//! than with `mockall` expectations: a scripted transport, and recorders for
//! notifications and telemetry. Available when the `testing` feature is
//! enabled.
//!
//! # Usage
//!
//! Add to your Cargo.toml:
//! ```toml
//! [dev-dependencies]
//! worldline-dashboard = { workspace = true, features = ["testing"] }
//! ```

#[cfg(any(test, feature = "testing"))]
mod fake_transport;
#[cfg(any(test, feature = "testing"))]
mod recorders;

#[cfg(any(test, feature = "testing"))]
pub use fake_transport::{FakeConnector, FakeSocket};
#[cfg(any(test, feature = "testing"))]
pub use recorders::{eventually, RecordingNotifier, RecordingTelemetry, StaticTokens};
