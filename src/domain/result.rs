//! Result type alias
//!
//! Provides a convenient `Result` alias used throughout the crate.

use crate::domain::errors::KaizenError;

/// Result type alias using [`KaizenError`]
pub type Result<T> = std::result::Result<T, KaizenError>;
