//! Password verification against stored hashes.

pub mod verifier;

pub use verifier::{HashScheme, PasswordVerifier, verify_password};
