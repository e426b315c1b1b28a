//! Credential verification CLI commands.

use clap::{Args, Subcommand};

use crate::output;
use zonewatch_auth::{HashScheme, PasswordVerifier, TokenVerifier};
use zonewatch_core::config::AppConfig;
use zonewatch_core::error::AppError;

/// Arguments for auth commands
#[derive(Debug, Args)]
pub struct AuthArgs {
    /// Auth subcommand
    #[command(subcommand)]
    pub command: AuthCommand,
}

/// Auth subcommands
#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Check a password against a stored hash
    Password {
        /// Username (for logging)
        username: String,
        /// Supplied password
        password: String,
        /// Stored hash (`*...`, `$2?$...` or plain text)
        stored_hash: String,
    },
    /// Verify an access token and print its user
    Token {
        /// Encoded token
        token: String,
        /// HMAC signing key
        #[arg(short, long)]
        key: String,
    },
}

/// Execute auth commands
pub fn execute(args: &AuthArgs, config: &AppConfig) -> Result<(), AppError> {
    match &args.command {
        AuthCommand::Password {
            username,
            password,
            stored_hash,
        } => {
            let scheme = HashScheme::detect(stored_hash)
                .map(|s| s.to_string())
                .unwrap_or_else(|| "invalid".to_string());
            if PasswordVerifier::new().verify(username, password, stored_hash) {
                output::print_success(&format!("Password accepted ({})", scheme));
            } else {
                return Err(AppError::authentication(format!(
                    "Password rejected ({})",
                    scheme
                )));
            }
        }
        AuthCommand::Token { token, key } => {
            let user = TokenVerifier::new(key, &config.auth).verify(token)?;
            output::print_success(&format!("Token valid for user '{}'", user));
        }
    }

    Ok(())
}
