//! Claims carried by Zonewatch access tokens.

use serde::{Deserialize, Serialize};

/// Token type accepted by [`TokenVerifier`](super::TokenVerifier).
pub const ACCESS_TOKEN_TYPE: &str = "access";

/// Payload of an access token.
///
/// `token_type` and `user` are optional here so that a token missing them
/// can be reported precisely instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Issuer.
    pub iss: String,
    /// Expiration time (UTC timestamp), if the issuer set one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Issued-at time (UTC timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// `access` or `refresh`.
    #[serde(rename = "type", default)]
    pub token_type: Option<String>,
    /// Username the token was issued to.
    #[serde(default)]
    pub user: Option<String>,
}
