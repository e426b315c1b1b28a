//! Access-token verification and claims.

pub mod claims;
pub mod verifier;

pub use claims::AccessClaims;
pub use verifier::{TokenVerifier, verify_token};
