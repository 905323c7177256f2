//! Headless navigation: routes are logged and the redirect path is kept in
//! memory.

use std::sync::Mutex;

use crate::application::streaming::lock;
use crate::ports::outbound::{NavigationState, Navigator, RedirectStore};

#[derive(Debug, Default)]
pub struct LoggingNavigator {
    current: Mutex<Option<String>>,
}

impl LoggingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_route(&self) -> Option<String> {
        lock(&self.current).clone()
    }
}

impl Navigator for LoggingNavigator {
    fn navigate(&self, route: &str, state: Option<NavigationState>) {
        match &state {
            Some(state) => tracing::info!(
                route,
                reason = %state.reason,
                required_roles = ?state.required_roles,
                "Navigate"
            ),
            None => tracing::info!(route, "Navigate"),
        }
        *lock(&self.current) = Some(route.to_string());
    }
}

#[derive(Debug, Default)]
pub struct MemoryRedirectStore {
    path: Mutex<Option<String>>,
}

impl MemoryRedirectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RedirectStore for MemoryRedirectStore {
    fn remember(&self, path: &str) {
        *lock(&self.path) = Some(path.to_string());
    }

    fn take(&self) -> Option<String> {
        lock(&self.path).take()
    }
}
