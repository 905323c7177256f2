//! Navigation Port - route changes and post-login redirect memory

use worldline_domain::AccessReason;

/// Transient state handed to the denial view. Never persisted or URL-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    pub reason: AccessReason,
    pub required_roles: Vec<String>,
}

#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str, state: Option<NavigationState>);
}

/// Remembers where to send the user once they have signed in.
#[cfg_attr(test, mockall::automock)]
pub trait RedirectStore: Send + Sync {
    fn remember(&self, path: &str);

    fn take(&self) -> Option<String>;
}
