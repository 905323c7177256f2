//! `tracing`-backed telemetry and toast sinks.

use crate::ports::outbound::{Notification, NotificationLevel, Notifier, Properties, Telemetry};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn report_error(&self, context: &str, message: &str) {
        tracing::error!(context, error = message, "Reported error");
    }

    fn track_event(&self, name: &str, properties: &Properties) {
        tracing::info!(event = name, properties = ?properties, "Tracked event");
    }
}

/// Logs every toast instead of showing it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        let message = notification.message;
        match notification.level {
            NotificationLevel::Info => tracing::info!(target: "worldline_dashboard::toast", "{message}"),
            NotificationLevel::Success => {
                tracing::info!(target: "worldline_dashboard::toast", success = true, "{message}")
            }
            NotificationLevel::Warning => tracing::warn!(target: "worldline_dashboard::toast", "{message}"),
            NotificationLevel::Error => tracing::error!(target: "worldline_dashboard::toast", "{message}"),
        }
    }
}
