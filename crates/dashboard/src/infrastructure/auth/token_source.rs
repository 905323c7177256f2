//! Token sources backed by an ID token.

use async_trait::async_trait;
use tokio::sync::watch;
use worldline_domain::Identity;

use super::id_token::from_id_token;
use crate::ports::outbound::{TokenError, TokenSource};

/// A fixed token and the identity decoded from it.
#[derive(Debug, Clone)]
pub struct StaticTokenSource {
    token: String,
    identity: Identity,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Result<Self, TokenError> {
        let token = token.into();
        let identity = from_id_token(&token)?;
        Ok(Self { token, identity })
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn bearer_token(&self) -> Result<String, TokenError> {
        Ok(self.token.clone())
    }

    fn identity(&self) -> Option<Identity> {
        Some(self.identity.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Session {
    token: String,
    identity: Identity,
}

/// A session whose identity can change at runtime (account switch, logout).
///
/// Observers get the new identity through `changes()`.
pub struct SessionTokenSource {
    session: watch::Sender<Option<Session>>,
}

impl Default for SessionTokenSource {
    fn default() -> Self {
        let (session, _) = watch::channel(None);
        Self { session }
    }
}

impl SessionTokenSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or switch to) the session carried by `token`.
    pub fn sign_in(&self, token: impl Into<String>) -> Result<Identity, TokenError> {
        let token = token.into();
        let identity = from_id_token(&token)?;
        tracing::info!(id = %identity.id, roles = identity.roles.len(), "Signed in");
        self.session.send_replace(Some(Session {
            token,
            identity: identity.clone(),
        }));
        Ok(identity)
    }

    pub fn sign_out(&self) {
        if self.session.send_replace(None).is_some() {
            tracing::info!("Signed out");
        }
    }

    /// Receiver that wakes on every sign-in, switch and sign-out.
    pub fn changes(&self) -> watch::Receiver<Option<Identity>> {
        let (tx, rx) = watch::channel(self.identity());
        let mut sessions = self.session.subscribe();
        tokio::spawn(async move {
            while sessions.changed().await.is_ok() {
                let identity = sessions.borrow_and_update().as_ref().map(|s| s.identity.clone());
                if tx.send(identity).is_err() {
                    break;
                }
            }
        });
        rx
    }
}

#[async_trait]
impl TokenSource for SessionTokenSource {
    async fn bearer_token(&self) -> Result<String, TokenError> {
        self.session
            .borrow()
            .as_ref()
            .map(|s| s.token.clone())
            .ok_or(TokenError::NotSignedIn)
    }

    fn identity(&self) -> Option<Identity> {
        self.session.borrow().as_ref().map(|s| s.identity.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::auth::id_token::sign_test_token;
    use serde_json::json;

    fn token(oid: &str, roles: &[&str]) -> String {
        sign_test_token(&json!({"oid": oid, "name": oid, "roles": roles}))
    }

    #[tokio::test]
    async fn test_static_source_serves_token_and_identity() {
        let raw = token("u-1", &["Admin"]);
        let source = StaticTokenSource::new(raw.clone()).unwrap();

        assert_eq!(source.bearer_token().await.unwrap(), raw);
        assert!(source.identity().unwrap().has_role("admin"));
    }

    #[tokio::test]
    async fn test_session_switch_and_sign_out() {
        let source = SessionTokenSource::new();
        assert_eq!(source.bearer_token().await, Err(TokenError::NotSignedIn));

        let mut changes = source.changes();
        source.sign_in(token("u-1", &[])).unwrap();
        changes.changed().await.unwrap();
        assert_eq!(changes.borrow_and_update().as_ref().map(|i| i.id.clone()), Some("u-1".into()));

        source.sign_in(token("u-2", &["Researcher"])).unwrap();
        changes.changed().await.unwrap();
        assert_eq!(changes.borrow_and_update().as_ref().map(|i| i.id.clone()), Some("u-2".into()));

        source.sign_out();
        changes.changed().await.unwrap();
        assert!(changes.borrow().is_none());
        assert!(source.identity().is_none());
    }

    #[test]
    fn test_invalid_token_keeps_previous_session() {
        let source = SessionTokenSource::new();
        source.sign_in(token("u-1", &[])).unwrap();
        assert!(source.sign_in("garbage").is_err());
        assert_eq!(source.identity().map(|i| i.id), Some("u-1".to_string()));
    }
}
