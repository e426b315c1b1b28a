//! Convenience result type alias for Zonewatch.

use crate::error::AppError;

/// A specialized `Result` type for Zonewatch operations.
pub type AppResult<T> = Result<T, AppError>;
