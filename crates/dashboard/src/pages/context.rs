//! Collaborators shared by every page controller.

use std::sync::Arc;

use crate::application::access::RouteGuard;
use crate::application::streaming::{StreamingClient, StreamingSettings};
use crate::ports::outbound::{
    Navigator, Notifier, RedirectStore, RequestGateway, Telemetry, TokenSource, TransportConnector,
};

/// Constructor-injected collaborators. Cloning shares them.
#[derive(Clone)]
pub struct PageContext {
    pub tokens: Arc<dyn TokenSource>,
    pub gateway: Arc<dyn RequestGateway>,
    pub connector: Arc<dyn TransportConnector>,
    pub telemetry: Arc<dyn Telemetry>,
    pub notifier: Arc<dyn Notifier>,
    pub navigator: Arc<dyn Navigator>,
    pub redirects: Arc<dyn RedirectStore>,
    pub streaming: StreamingSettings,
}

impl PageContext {
    /// A fresh client for `channel`; pages never share one.
    pub fn streaming_client(&self, channel: &str) -> Arc<StreamingClient> {
        Arc::new(StreamingClient::new(
            &self.streaming,
            channel,
            Arc::clone(&self.connector),
            Arc::clone(&self.telemetry),
        ))
    }

    pub fn route_guard(&self, required_roles: &[&str]) -> RouteGuard {
        RouteGuard::new(
            required_roles.iter().copied(),
            Arc::clone(&self.navigator),
            Arc::clone(&self.redirects),
            Arc::clone(&self.telemetry),
        )
    }
}

/// Result of mounting a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountOutcome {
    /// The gate denied access; the navigator was sent to the denial route.
    Denied(worldline_domain::AccessDecision),
    /// Mounted. `connected` tells whether the live connection came up.
    Mounted { connected: bool },
}

impl MountOutcome {
    pub fn is_mounted(&self) -> bool {
        matches!(self, MountOutcome::Mounted { .. })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::infrastructure::{LoggingNavigator, MemoryRedirectStore};
    use crate::ports::outbound::testing::{
        FakeConnector, RecordingNotifier, RecordingTelemetry, StaticTokens,
    };

    /// A context wired to in-memory doubles, with handles to inspect them.
    pub(crate) struct TestPage {
        pub ctx: PageContext,
        pub tokens: Arc<StaticTokens>,
        pub connector: Arc<FakeConnector>,
        pub telemetry: Arc<RecordingTelemetry>,
        pub notifier: Arc<RecordingNotifier>,
        pub navigator: Arc<LoggingNavigator>,
        pub redirects: Arc<MemoryRedirectStore>,
    }

    pub(crate) fn test_context(tokens: StaticTokens, gateway: Arc<dyn RequestGateway>) -> TestPage {
        let tokens = Arc::new(tokens);
        let connector = Arc::new(FakeConnector::new());
        let telemetry = Arc::new(RecordingTelemetry::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let navigator = Arc::new(LoggingNavigator::new());
        let redirects = Arc::new(MemoryRedirectStore::new());
        let ctx = PageContext {
            tokens: tokens.clone(),
            gateway,
            connector: connector.clone(),
            telemetry: telemetry.clone(),
            notifier: notifier.clone(),
            navigator: navigator.clone(),
            redirects: redirects.clone(),
            streaming: StreamingSettings {
                base_url: "ws://backend/ws".into(),
                echo_marker: "[echo]".into(),
            },
        };
        TestPage {
            ctx,
            tokens,
            connector,
            telemetry,
            notifier,
            navigator,
            redirects,
        }
    }
}
