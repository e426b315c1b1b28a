//! # zonewatch-core
//!
//! Core crate for Zonewatch. Contains configuration schemas and the unified
//! error system shared by the plugin host, the authentication oracle, and
//! the binaries.
//!
//! This crate has **no** internal dependencies on other Zonewatch crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::AppError;
pub use result::AppResult;
