//! HS256 access-token verification.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use tracing::{debug, error, info};

use zonewatch_core::config::AuthConfig;
use zonewatch_core::error::AppError;

use super::claims::{ACCESS_TOKEN_TYPE, AccessClaims};

/// Verifies access tokens signed with a shared HMAC key.
#[derive(Clone)]
pub struct TokenVerifier {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenVerifier {
    /// Creates a verifier for tokens signed with `key`.
    pub fn new(key: &str, config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // `exp` is checked when present but not required.
        validation.set_required_spec_claims::<&str>(&[]);
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.leeway = config.token_leeway_seconds;
        validation.set_issuer(&[config.token_issuer.as_str()]);

        Self {
            decoding_key: DecodingKey::from_secret(key.as_bytes()),
            validation,
        }
    }

    /// Verifies `token` and returns the username it was issued to.
    ///
    /// Checks:
    /// 1. Signature and algorithm
    /// 2. Issuer
    /// 3. Expiration, if present
    /// 4. Token type is `access`
    /// 5. A `user` claim is present
    pub fn verify(&self, token: &str) -> Result<String, AppError> {
        let claims = self.decode_token(token)?;

        match claims.token_type.as_deref() {
            Some(ACCESS_TOKEN_TYPE) => {}
            Some(other) => {
                return Err(AppError::authentication(format!(
                    "Only access tokens are allowed, got '{other}' token"
                )));
            }
            None => return Err(AppError::authentication("Missing token type")),
        }

        let user = claims
            .user
            .ok_or_else(|| AppError::authentication("User not found in token claims"))?;
        info!(user = %user, "Token verified");
        Ok(user)
    }

    fn decode_token(&self, token: &str) -> Result<AccessClaims, AppError> {
        let token_data = decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::authentication("Token has expired")
                }
                jsonwebtoken::errors::ErrorKind::InvalidToken => {
                    AppError::authentication("Invalid token format")
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AppError::authentication("Invalid token signature")
                }
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => {
                    AppError::authentication("Invalid token issuer")
                }
                _ => AppError::authentication(format!("Token validation failed: {e}")),
            })?;

        debug!(iss = %token_data.claims.iss, "Token signature verified");
        Ok(token_data.claims)
    }
}

/// Verifies `token` with default settings; returns the username or `None`.
pub fn verify_token(token: &str, key: &str) -> Option<String> {
    TokenVerifier::new(key, &AuthConfig::default())
        .verify(token)
        .inspect_err(|e| error!(error = %e, "Unable to verify token"))
        .ok()
}
