//! Domain error types
//!
//! This module defines the error hierarchy for the conversion pipeline.
//! Validation and rule findings are never errors: they accumulate as
//! [`Issue`](crate::domain::report::Issue) values in reports. The types
//! here cover programmer mistakes and impossible states only.

use thiserror::Error;

/// Main error type
///
/// This is the primary error type used throughout the crate.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum KaizenError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Segment writer errors
    #[error("Writer error: {0}")]
    Writer(#[from] WriterError),

    /// Validation plumbing errors (not validation findings)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Batch processing errors
    #[error("Batch error: {0}")]
    Batch(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Segment writer errors
///
/// The writer is the last line of defense: a claim reaching it with a
/// missing mandatory field means the validator was bypassed. These
/// errors are thrown, and the batch processor converts them into batch
/// report entries per claim.
#[derive(Debug, Error)]
pub enum WriterError {
    /// A mandatory field was absent at emission time
    #[error("Missing mandatory field: {field}")]
    MissingField { field: String },

    /// An element contained a reserved delimiter character
    #[error("Element {element:?} contains reserved separator {separator:?}")]
    ReservedCharacter { element: String, separator: char },

    /// A segment would have been emitted with no elements
    #[error("Segment {tag} has no non-empty elements")]
    EmptySegment { tag: String },

    /// ST/SE bookkeeping was violated
    #[error("Unbalanced transaction: {0}")]
    UnbalancedTransaction(String),
}

impl WriterError {
    /// Creates a missing-field error
    pub fn missing(field: impl Into<String>) -> Self {
        WriterError::MissingField {
            field: field.into(),
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for KaizenError {
    fn from(err: std::io::Error) -> Self {
        KaizenError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for KaizenError {
    fn from(err: serde_json::Error) -> Self {
        KaizenError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for KaizenError {
    fn from(err: toml::de::Error) -> Self {
        KaizenError::Configuration(format!("TOML parse error: {err}"))
    }
}
