//! Page-level guard: yields content or redirects to the denial view.

use std::sync::Arc;

use worldline_domain::{decide, AccessDecision, Identity};

use crate::ports::outbound::{NavigationState, Navigator, Properties, RedirectStore, Telemetry};

/// Fixed route of the denial view.
pub const UNAUTHORIZED_ROUTE: &str = "/unauthorized";

/// Telemetry event emitted on every denial.
pub const ACCESS_DENIED_EVENT: &str = "access_denied";

pub struct RouteGuard {
    required_roles: Vec<String>,
    navigator: Arc<dyn Navigator>,
    redirects: Arc<dyn RedirectStore>,
    telemetry: Arc<dyn Telemetry>,
}

impl RouteGuard {
    pub fn new<I, S>(
        required_roles: I,
        navigator: Arc<dyn Navigator>,
        redirects: Arc<dyn RedirectStore>,
        telemetry: Arc<dyn Telemetry>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required_roles: required_roles.into_iter().map(Into::into).collect(),
            navigator,
            redirects,
            telemetry,
        }
    }

    pub fn required_roles(&self) -> &[String] {
        &self.required_roles
    }

    /// Evaluate the guard for the page at `current_path`.
    ///
    /// On denial the path is remembered for the post-login redirect, a
    /// telemetry event is tracked and the navigator is sent to the denial
    /// route with the required roles as transient state.
    pub fn check(&self, identity: Option<&Identity>, current_path: &str) -> AccessDecision {
        let decision = decide(identity, &self.required_roles);
        if decision.allowed {
            return decision;
        }

        tracing::info!(
            path = current_path,
            reason = %decision.reason,
            required = ?self.required_roles,
            "Access denied"
        );
        self.redirects.remember(current_path);

        let mut properties = Properties::new();
        properties.insert("path".to_string(), current_path.to_string());
        properties.insert("reason".to_string(), decision.reason.to_string());
        properties.insert("required_roles".to_string(), self.required_roles.join(","));
        self.telemetry.track_event(ACCESS_DENIED_EVENT, &properties);

        self.navigator.navigate(
            UNAUTHORIZED_ROUTE,
            Some(NavigationState {
                reason: decision.reason,
                required_roles: self.required_roles.clone(),
            }),
        );
        decision
    }

    /// Yield the guarded content when allowed; redirect and yield nothing
    /// otherwise.
    pub fn render<T>(
        &self,
        identity: Option<&Identity>,
        current_path: &str,
        content: impl FnOnce() -> T,
    ) -> Option<T> {
        self.check(identity, current_path)
            .allowed
            .then(content)
    }
}
