//! Binder error types.

use std::path::PathBuf;

use thiserror::Error;

/// A field's raw text could not be converted.
///
/// Field-scoped: the binder records it in the page's `Errors` and moves on
/// to the next field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// Text is not a valid value for the target type.
    #[error("Invalid {expected} value: {value}")]
    InvalidValue {
        /// Type name the converter produces.
        expected: &'static str,
        /// Rejected text.
        value: String,
    },

    /// Value outside the accepted range.
    #[error("Value out of range: {0}")]
    OutOfRange(String),
}

/// A temporary file could not be deleted.
#[derive(Error, Debug)]
#[error("failed to delete {} (field {field}): {source}", .path.display())]
pub struct CleanupFailure {
    /// Field the file was bound to.
    pub field: String,
    /// Path of the file.
    pub path: PathBuf,
    /// Underlying I/O error.
    #[source]
    pub source: std::io::Error,
}
