//! Streaming connection, status and observer plumbing.

mod client;
mod observers;
mod status;

pub use client::{StreamingClient, StreamingSettings};
pub use observers::{ObserverRegistry, Subscription};
pub use status::{ConnectionStatus, StatusBadge};

pub(crate) use observers::lock;

use std::sync::Arc;

/// A page's hold on one streaming client.
///
/// Collects every subscription the page registers so teardown can remove all
/// of them before disconnecting. Teardown runs on `release()` and again,
/// harmlessly, on drop.
pub struct LiveBinding {
    client: Arc<StreamingClient>,
    subscriptions: Vec<Subscription>,
}

impl LiveBinding {
    pub fn new(client: Arc<StreamingClient>) -> Self {
        Self {
            client,
            subscriptions: Vec::new(),
        }
    }

    pub fn client(&self) -> &Arc<StreamingClient> {
        &self.client
    }

    pub fn hold(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    /// Unsubscribe every held observer, then disconnect.
    pub fn release(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
        self.client.disconnect();
    }
}

impl Drop for LiveBinding {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::testing::{FakeConnector, RecordingTelemetry, StaticTokens};
    use worldline_domain::Identity;

    #[tokio::test]
    async fn test_release_unsubscribes_then_disconnects() {
        let connector = Arc::new(FakeConnector::new());
        let settings = StreamingSettings {
            base_url: "ws://backend/ws".into(),
            echo_marker: "[echo]".into(),
        };
        let client = Arc::new(StreamingClient::new(
            &settings,
            "customers",
            connector.clone(),
            Arc::new(RecordingTelemetry::new()),
        ));
        let tokens = StaticTokens::signed_in(Identity::new("u-1", "Kurisu"));

        let mut binding = LiveBinding::new(Arc::clone(&client));
        binding.hold(client.subscribe(|_| {}));
        binding.hold(client.subscribe_to_status(|_| {}));
        assert!(client.connect(&tokens).await);
        assert_eq!(client.observer_count(), 2);

        drop(binding);

        assert_eq!(client.observer_count(), 0);
        assert_eq!(client.status(), ConnectionStatus::Disconnected);
        assert!(connector.last().unwrap().is_closed());
    }
}
