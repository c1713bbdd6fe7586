//! Convenience result type alias for HotRoute.

use crate::error::AppError;

/// A specialized `Result` type for HotRoute operations.
pub type AppResult<T> = Result<T, AppError>;
