//! Telemetry Port - fire-and-forget error and event reporting

use std::collections::BTreeMap;

pub type Properties = BTreeMap<String, String>;

#[cfg_attr(test, mockall::automock)]
pub trait Telemetry: Send + Sync {
    /// Report a caught error. `context` names the failing operation.
    fn report_error(&self, context: &str, message: &str);

    fn track_event(&self, name: &str, properties: &Properties);
}
