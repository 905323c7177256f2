//! Recording doubles for notifier, telemetry and token source.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use worldline_domain::Identity;

use crate::application::streaming::lock;
use crate::ports::outbound::{
    Notification, NotificationLevel, Notifier, Properties, Telemetry, TokenError, TokenSource,
};

#[derive(Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Notification> {
        lock(&self.notifications).clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.all().into_iter().map(|n| n.message).collect()
    }

    pub fn at_level(&self, level: NotificationLevel) -> Vec<String> {
        self.all()
            .into_iter()
            .filter(|n| n.level == level)
            .map(|n| n.message)
            .collect()
    }

    pub fn clear(&self) {
        lock(&self.notifications).clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        lock(&self.notifications).push(notification);
    }
}

#[derive(Default)]
pub struct RecordingTelemetry {
    errors: Mutex<Vec<(String, String)>>,
    events: Mutex<Vec<(String, Properties)>>,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(context, message)` pairs, in report order.
    pub fn errors(&self) -> Vec<(String, String)> {
        lock(&self.errors).clone()
    }

    pub fn events(&self) -> Vec<(String, Properties)> {
        lock(&self.events).clone()
    }
}

impl Telemetry for RecordingTelemetry {
    fn report_error(&self, context: &str, message: &str) {
        lock(&self.errors).push((context.to_string(), message.to_string()));
    }

    fn track_event(&self, name: &str, properties: &Properties) {
        lock(&self.events).push((name.to_string(), properties.clone()));
    }
}

/// Token source with a switchable identity; counts token requests.
pub struct StaticTokens {
    token: Mutex<Result<String, TokenError>>,
    identity: Mutex<Option<Identity>>,
    requests: Mutex<usize>,
}

impl StaticTokens {
    pub fn signed_in(identity: Identity) -> Self {
        Self {
            token: Mutex::new(Ok("test-token".to_string())),
            identity: Mutex::new(Some(identity)),
            requests: Mutex::new(0),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            token: Mutex::new(Err(TokenError::NotSignedIn)),
            identity: Mutex::new(None),
            requests: Mutex::new(0),
        }
    }

    pub fn set_identity(&self, identity: Option<Identity>) {
        *lock(&self.identity) = identity;
    }

    pub fn fail_tokens(&self, error: TokenError) {
        *lock(&self.token) = Err(error);
    }

    pub fn token_requests(&self) -> usize {
        *lock(&self.requests)
    }
}

#[async_trait]
impl TokenSource for StaticTokens {
    async fn bearer_token(&self) -> Result<String, TokenError> {
        *lock(&self.requests) += 1;
        lock(&self.token).clone()
    }

    fn identity(&self) -> Option<Identity> {
        lock(&self.identity).clone()
    }
}

/// Poll `condition` until it holds or a second passes.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
