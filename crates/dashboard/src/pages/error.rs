//! Page-level failures surfaced to the presentation layer.

use crate::ports::outbound::GatewayError;

/// A failed page operation. The collection is never mutated when one of these
/// is produced.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PageError {
    #[error("Failed to load {entity}: {source}")]
    Load {
        entity: &'static str,
        #[source]
        source: GatewayError,
    },

    #[error("Failed to create {entity}: {source}")]
    Create {
        entity: &'static str,
        #[source]
        source: GatewayError,
    },

    #[error("Failed to update {entity}: {source}")]
    Update {
        entity: &'static str,
        #[source]
        source: GatewayError,
    },

    #[error("Failed to delete {entity}: {source}")]
    Delete {
        entity: &'static str,
        #[source]
        source: GatewayError,
    },

    #[error("No {entity} is being edited")]
    NothingToSave { entity: &'static str },
}

impl PageError {
    pub fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            PageError::Load { source, .. }
            | PageError::Create { source, .. }
            | PageError::Update { source, .. }
            | PageError::Delete { source, .. } => Some(source),
            PageError::NothingToSave { .. } => None,
        }
    }

    /// Text for the error banner.
    pub fn user_message(&self) -> String {
        if self.gateway_error().is_some_and(GatewayError::is_unauthorized) {
            return "Your session has expired or lacks permission. Please sign in again.".into();
        }
        let (verb, entity) = match self {
            PageError::Load { entity, .. } => ("load", entity),
            PageError::Create { entity, .. } => ("create", entity),
            PageError::Update { entity, .. } => ("update", entity),
            PageError::Delete { entity, .. } => ("delete", entity),
            PageError::NothingToSave { .. } => return self.to_string(),
        };
        match self.gateway_error().and_then(GatewayError::status_code) {
            Some(status) => format!("Could not {verb} {entity} (HTTP {status}). Please try again."),
            None => format!("Could not {verb} {entity}. Check your connection and try again."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::TokenError;

    #[test]
    fn test_user_message_distinguishes_causes() {
        let server = PageError::Load {
            entity: "customer",
            source: GatewayError::status(500, "Internal Server Error"),
        };
        assert_eq!(server.user_message(), "Could not load customer (HTTP 500). Please try again.");

        let offline = PageError::Delete {
            entity: "D-Mail",
            source: GatewayError::Network("connection refused".into()),
        };
        assert_eq!(
            offline.user_message(),
            "Could not delete D-Mail. Check your connection and try again."
        );

        let expired = PageError::Update {
            entity: "experiment",
            source: GatewayError::Token(TokenError::NotSignedIn),
        };
        assert!(expired.user_message().contains("sign in again"));
    }
}
