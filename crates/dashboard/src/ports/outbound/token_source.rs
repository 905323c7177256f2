//! Token Source Port - bearer tokens and the active identity
//!
//! Token acquisition (popup/redirect login against the identity provider) is
//! owned by the adapter. The core only asks for a token immediately before each
//! REST call or streaming connect and never caches it.

use async_trait::async_trait;
use worldline_domain::Identity;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("No signed-in identity")]
    NotSignedIn,

    #[error("Token acquisition failed: {0}")]
    Acquisition(String),

    #[error("Invalid identity token: {0}")]
    InvalidToken(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// A bearer token valid for one backend call or connect.
    async fn bearer_token(&self) -> Result<String, TokenError>;

    /// The active identity, `None` when signed out.
    fn identity(&self) -> Option<Identity>;
}
