//! Identity claims from an identity-provider ID token.
//!
//! The token comes straight from the provider's sign-in flow, so only its
//! claims are read here. Signature and expiry checks belong to the backend
//! that receives the bearer token.

use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};
use serde::Deserialize;
use worldline_domain::Identity;

use crate::ports::outbound::TokenError;

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    /// Object id (Entra ID); preferred over `sub` when present.
    oid: Option<String>,
    sub: Option<String>,
    name: Option<String>,
    preferred_username: Option<String>,
    email: Option<String>,
    #[serde(default)]
    roles: Vec<String>,
}

/// Decode the identity carried by `token`.
pub fn from_id_token(token: &str) -> Result<Identity, TokenError> {
    let header = decode_header(token).map_err(|e| TokenError::InvalidToken(e.to_string()))?;

    let mut validation = Validation::new(header.alg);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let claims = decode::<IdTokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| TokenError::InvalidToken(e.to_string()))?
        .claims;

    let id = claims
        .oid
        .or(claims.sub)
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| TokenError::InvalidToken("token carries neither oid nor sub".into()))?;
    let username = claims.preferred_username.or(claims.email);
    let display_name = claims
        .name
        .or_else(|| username.clone())
        .unwrap_or_else(|| id.clone());

    let mut identity = Identity::new(id, display_name).with_roles(claims.roles);
    if let Some(username) = username {
        identity = identity.with_username(username);
    }
    Ok(identity)
}

#[cfg(test)]
pub(crate) fn sign_test_token(claims: &serde_json::Value) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};
    encode(&Header::default(), claims, &EncodingKey::from_secret(b"test-secret"))
        .unwrap_or_default()
}
