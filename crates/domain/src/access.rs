//! Role-based access decisions.
//!
//! `decide` is the only place role requirements are evaluated. Route guards,
//! link guards and the navigation menu all go through it so that the
//! conjunction and case-insensitivity rules hold uniformly.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessReason {
    NoIdentity,
    MissingRoles,
    Allowed,
}

impl fmt::Display for AccessReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessReason::NoIdentity => write!(f, "no-identity"),
            AccessReason::MissingRoles => write!(f, "missing-roles"),
            AccessReason::Allowed => write!(f, "allowed"),
        }
    }
}

/// Outcome of evaluating a role requirement against the active identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: AccessReason,
    /// The required roles, populated only for `missing-roles`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

impl AccessDecision {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            reason: AccessReason::Allowed,
            roles: Vec::new(),
        }
    }

    pub fn no_identity() -> Self {
        Self {
            allowed: false,
            reason: AccessReason::NoIdentity,
            roles: Vec::new(),
        }
    }

    pub fn missing_roles(roles: Vec<String>) -> Self {
        Self {
            allowed: false,
            reason: AccessReason::MissingRoles,
            roles,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }
}

/// Decide whether `identity` may see content that requires every role in
/// `required_roles`.
pub fn decide<R: AsRef<str>>(identity: Option<&Identity>, required_roles: &[R]) -> AccessDecision {
    let Some(identity) = identity else {
        return AccessDecision::no_identity();
    };

    if required_roles.is_empty() {
        return AccessDecision::allowed();
    }

    let holds_all = required_roles
        .iter()
        .all(|required| identity.has_role(required.as_ref()));

    if holds_all {
        AccessDecision::allowed()
    } else {
        AccessDecision::missing_roles(
            required_roles
                .iter()
                .map(|r| r.as_ref().to_string())
                .collect(),
        )
    }
}
