//! # zonewatch-auth
//!
//! Stateless credential checks used by the Zonewatch front ends.
//!
//! ## Modules
//!
//! - `password`: stored-hash verification (MySQL double SHA-1, bcrypt, plain text)
//! - `jwt`: HS256 access-token verification

pub mod jwt;
pub mod password;

pub use jwt::{AccessClaims, TokenVerifier, verify_token};
pub use password::{HashScheme, PasswordVerifier, verify_password};
