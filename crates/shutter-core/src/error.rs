//! Error types for coded-exposure processing.

use thiserror::Error;

/// Main error type for blur simulation and deconvolution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShutterError {
    /// A caller-supplied argument is out of range or malformed
    /// (unknown method name, empty code, zero-sum weights, too-narrow crop).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested mode exists by name but is intentionally unimplemented.
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// A single row of a deconvolution could not be solved.
    ///
    /// Never propagated out of the deconvolver; surfaced through
    /// per-row outcomes instead.
    #[error("Row {row} could not be solved: {reason}")]
    RowSolveFailure { row: usize, reason: String },

    /// Two images that must share a shape do not.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShutterError {
    /// Shorthand for an [`ShutterError::InvalidArgument`] with a formatted message.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Result type alias for coded-exposure operations.
pub type Result<T> = std::result::Result<T, ShutterError>;
