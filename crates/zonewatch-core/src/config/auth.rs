//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Access-token verification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Issuer every accepted token must carry.
    #[serde(default = "default_token_issuer")]
    pub token_issuer: String,
    /// Clock-skew leeway applied to `exp` checks, in seconds.
    #[serde(default = "default_leeway")]
    pub token_leeway_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_issuer: default_token_issuer(),
            token_leeway_seconds: default_leeway(),
        }
    }
}

fn default_token_issuer() -> String {
    "ZoneMinder".to_string()
}

fn default_leeway() -> u64 {
    5
}
