//! Stored password hash verification.
//!
//! The scheme is chosen by inspecting the stored hash, in this order:
//! `*` prefix (MySQL `PASSWORD()` double SHA-1), `$2?$` prefix (bcrypt),
//! anything else is compared as plain text.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use tracing::{debug, error, info, warn};

/// Stored hashes shorter than this cannot be classified.
const MIN_STORED_LEN: usize = 4;

/// Format of a stored password hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashScheme {
    /// `*` followed by the uppercase hex of SHA1(SHA1(password)).
    MysqlDoubleSha1,
    /// `$2a$`, `$2b$`, `$2y$` ... bcrypt hash.
    Bcrypt,
    /// The password itself.
    Plain,
}

impl HashScheme {
    /// Classifies a stored hash; `None` if it is too short to check.
    pub fn detect(stored_hash: &str) -> Option<Self> {
        let bytes = stored_hash.as_bytes();
        if bytes.len() < MIN_STORED_LEN {
            return None;
        }
        Some(match bytes {
            [b'*', ..] => Self::MysqlDoubleSha1,
            [b'$', b'2', _, b'$', ..] => Self::Bcrypt,
            _ => Self::Plain,
        })
    }
}

impl fmt::Display for HashScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MysqlDoubleSha1 => write!(f, "mysql-sha1"),
            Self::Bcrypt => write!(f, "bcrypt"),
            Self::Plain => write!(f, "plain"),
        }
    }
}

/// Verifies supplied passwords against stored hashes.
#[derive(Debug, Clone, Default)]
pub struct PasswordVerifier;

impl PasswordVerifier {
    /// Creates a new password verifier.
    pub fn new() -> Self {
        Self
    }

    /// Returns `true` if `supplied` matches `stored_hash`.
    ///
    /// `username` is used for logging only.
    pub fn verify(&self, username: &str, supplied: &str, stored_hash: &str) -> bool {
        let Some(scheme) = HashScheme::detect(stored_hash) else {
            error!(user = %username, "Stored password hash is too short or invalid to check");
            return false;
        };

        match scheme {
            HashScheme::MysqlDoubleSha1 => {
                info!(user = %username, scheme = %scheme, "Verifying password");
                mysql_password(supplied) == stored_hash
            }
            HashScheme::Bcrypt => {
                info!(user = %username, scheme = %scheme, "Verifying password");
                bcrypt::verify(supplied, stored_hash).unwrap_or_else(|e| {
                    warn!(user = %username, error = %e, "bcrypt verification failed");
                    false
                })
            }
            HashScheme::Plain => {
                warn!(user = %username, "Plain text password in use, please store a hash instead");
                supplied == stored_hash
            }
        }
    }
}

/// Shorthand for [`PasswordVerifier::verify`].
pub fn verify_password(username: &str, supplied: &str, stored_hash: &str) -> bool {
    PasswordVerifier::new().verify(username, supplied, stored_hash)
}

/// MySQL `PASSWORD()` format: `*` + uppercase hex of SHA1(SHA1(password)).
fn mysql_password(password: &str) -> String {
    let interim = Sha1::digest(password.as_bytes());
    let digest = Sha1::digest(interim);
    let hash = format!("*{}", hex::encode_upper(digest));
    debug!(computed = %hash, "Computed double SHA-1 hash");
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_DOUBLE_SHA1: &str = "*94BDCEBE19083CE2A1F959FD02F964C7AF4CFC29";
    const TEST_SINGLE_SHA1: &str = "*A94A8FE5CCB19BA61C4C0873D391E987982FBBD3";

    #[test]
    fn test_detect_scheme() {
        assert_eq!(HashScheme::detect("abc"), None);
        assert_eq!(HashScheme::detect("*ABC"), Some(HashScheme::MysqlDoubleSha1));
        assert_eq!(HashScheme::detect("$2b$10$abc"), Some(HashScheme::Bcrypt));
        assert_eq!(HashScheme::detect("$2bb10$abc"), Some(HashScheme::Plain));
        assert_eq!(HashScheme::detect("hunter2"), Some(HashScheme::Plain));
    }

    #[test]
    fn test_mysql_double_sha1() {
        assert!(verify_password("admin", "test", TEST_DOUBLE_SHA1));
        assert!(!verify_password("admin", "Test", TEST_DOUBLE_SHA1));
    }

    #[test]
    fn test_single_sha1_is_not_accepted() {
        assert!(!verify_password("admin", "test", TEST_SINGLE_SHA1));
    }

    #[test]
    fn test_mysql_hash_compared_exactly() {
        let lower = TEST_DOUBLE_SHA1.to_lowercase();
        assert!(!verify_password("admin", "test", &lower));
    }

    #[test]
    fn test_bcrypt() {
        let stored = bcrypt::hash("secret", 4).unwrap();
        assert!(verify_password("admin", "secret", &stored));
        assert!(!verify_password("admin", "wrong", &stored));
    }

    #[test]
    fn test_malformed_bcrypt_is_rejected() {
        assert!(!verify_password("admin", "$2b$garbage", "$2b$garbage"));
    }

    #[test]
    fn test_plain_text() {
        assert!(verify_password("admin", "hunter2", "hunter2"));
        assert!(!verify_password("admin", "hunter3", "hunter2"));
    }

    #[test]
    fn test_short_stored_hash_never_matches() {
        assert!(!verify_password("admin", "abc", "abc"));
        assert!(!verify_password("admin", "", ""));
    }
}
