//! The active authenticated principal.
//!
//! Role claims are compared case-insensitively everywhere; `Role` keeps the
//! spelling the identity provider issued so it can be displayed unchanged.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A single role claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Role(String);

impl Role {
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Role name cannot be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-cased form used for every comparison.
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }

    pub fn matches(&self, name: &str) -> bool {
        self.normalized() == name.trim().to_lowercase()
    }
}

impl PartialEq for Role {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for Role {}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Role {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.0
    }
}

/// The currently signed-in principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable identifier issued by the identity provider (object id / subject).
    pub id: String,
    pub display_name: String,
    /// Login name, usually email-like. Domain events name their actor with it.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl Identity {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            username: None,
            roles: Vec::new(),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Adds role claims, skipping blank names and duplicates.
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for role in roles.into_iter().filter_map(|r| Role::new(r).ok()) {
            if !self.roles.contains(&role) {
                self.roles.push(role);
            }
        }
        self
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|role| role.matches(name))
    }

    /// Whether an event actor descriptor refers to this identity.
    ///
    /// Actors arrive either as the login name or as the stable id.
    pub fn is_actor(&self, actor: &str) -> bool {
        let actor = actor.trim();
        if actor.is_empty() {
            return false;
        }
        actor.eq_ignore_ascii_case(&self.id)
            || self
                .username
                .as_deref()
                .is_some_and(|username| actor.eq_ignore_ascii_case(username))
    }

    pub fn fingerprint(&self) -> IdentityFingerprint {
        IdentityFingerprint {
            id: self.id.clone(),
            roles: self.roles.iter().map(Role::normalized).collect(),
        }
    }
}

/// The parts of an identity that role-gated views depend on.
///
/// Two identities with the same fingerprint gate identically, so a change in
/// fingerprint is what forces guards to re-evaluate and collections to reload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityFingerprint {
    id: String,
    roles: BTreeSet<String>,
}
