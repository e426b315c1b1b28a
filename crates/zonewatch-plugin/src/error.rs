//! Error types for discovery, loading and registration.
//!
//! None of these abort a discovery pass: the manager turns each into a log
//! entry plus a registry state update.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use zonewatch_core::error::AppError;

use crate::identity::PluginIdentity;

/// The plugin directory could not be read.
#[derive(Debug, Error)]
#[error("cannot read plugin directory '{}': {source}", .path.display())]
pub struct DiscoveryError {
    /// Directory that was scanned.
    pub path: PathBuf,
    /// Underlying I/O failure.
    #[source]
    pub source: std::io::Error,
}

/// Error raised by a plugin's registration entry point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The plugin hit a runtime condition it could not handle.
    #[error("runtime error: {0}")]
    Runtime(String),
    /// The plugin detected a programming or contract violation.
    #[error("logic error: {0}")]
    Logic(String),
    /// The entry point panicked.
    #[error("panicked: {0}")]
    Panicked(String),
    /// The entry point returned a status code outside the ABI.
    #[error("unknown error (status {0})")]
    Unknown(i32),
}

/// Why a candidate could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file is not a loadable module for this platform.
    #[error("'{}' is not a loadable module: {reason}", .path.display())]
    InvalidModule {
        /// Candidate path.
        path: PathBuf,
        /// Loader diagnostic.
        reason: String,
    },
    /// The module does not export the registration entry point.
    #[error("'{}' does not export '{symbol}'", .path.display())]
    MissingEntryPoint {
        /// Candidate path.
        path: PathBuf,
        /// Symbol that was looked up.
        symbol: String,
    },
    /// The registration entry point reported a failure.
    #[error("registration failed: {0}")]
    Registration(#[from] RegistrationError),
    /// A module with this identity is already loaded.
    #[error("plugin '{0}' is already loaded")]
    AlreadyLoaded(PluginIdentity),
}

/// Cause category of a failed load, kept in the registry for operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadFailure {
    /// Not a valid native module.
    InvalidModule,
    /// Registration entry point missing.
    MissingEntryPoint,
    /// Entry point raised a runtime error.
    Runtime,
    /// Entry point raised a logic error.
    Logic,
    /// Entry point panicked or returned an unknown status.
    Panicked,
    /// Identity already loaded.
    AlreadyLoaded,
}

impl LoadError {
    /// Returns the cause category of this error.
    pub fn failure(&self) -> LoadFailure {
        match self {
            Self::InvalidModule { .. } => LoadFailure::InvalidModule,
            Self::MissingEntryPoint { .. } => LoadFailure::MissingEntryPoint,
            Self::Registration(RegistrationError::Runtime(_)) => LoadFailure::Runtime,
            Self::Registration(RegistrationError::Logic(_)) => LoadFailure::Logic,
            Self::Registration(RegistrationError::Panicked(_) | RegistrationError::Unknown(_)) => {
                LoadFailure::Panicked
            }
            Self::AlreadyLoaded(_) => LoadFailure::AlreadyLoaded,
        }
    }
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidModule => write!(f, "invalid_module"),
            Self::MissingEntryPoint => write!(f, "missing_entry_point"),
            Self::Runtime => write!(f, "runtime"),
            Self::Logic => write!(f, "logic"),
            Self::Panicked => write!(f, "panicked"),
            Self::AlreadyLoaded => write!(f, "already_loaded"),
        }
    }
}

impl From<LoadError> for AppError {
    fn from(err: LoadError) -> Self {
        AppError::plugin(err.to_string())
    }
}

impl From<DiscoveryError> for AppError {
    fn from(err: DiscoveryError) -> Self {
        AppError::plugin(err.to_string())
    }
}
