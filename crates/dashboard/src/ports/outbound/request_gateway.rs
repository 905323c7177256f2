//! Request Gateway Port - object-safe REST boundary
//!
//! Logical `(method, path, body)` in, parsed JSON out. Non-2xx responses come
//! back as `GatewayError::Status` carrying the status code and reason so the
//! presentation layer can render a distinguishable banner.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use super::token_source::TokenError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Put => write!(f, "PUT"),
            HttpMethod::Delete => write!(f, "DELETE"),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// The backend answered with a non-2xx status.
    #[error("HTTP {status} {reason}")]
    Status {
        status: u16,
        reason: String,
        body: String,
    },

    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    /// The response body was not the JSON we expected.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl GatewayError {
    pub fn status(status: u16, reason: impl Into<String>) -> Self {
        Self::Status {
            status,
            reason: reason.into(),
            body: String::new(),
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status_code(), Some(401) | Some(403))
            || matches!(self, Self::Token(TokenError::NotSignedIn))
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RequestGateway: Send + Sync {
    async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_renders_code_and_reason() {
        let err = GatewayError::status(404, "Not Found");
        assert_eq!(err.to_string(), "HTTP 404 Not Found");
        assert_eq!(err.status_code(), Some(404));
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn auth_failures_are_classified() {
        assert!(GatewayError::status(403, "Forbidden").is_unauthorized());
        assert!(GatewayError::from(TokenError::NotSignedIn).is_unauthorized());
        assert!(!GatewayError::Network("reset".into()).is_unauthorized());
    }
}
