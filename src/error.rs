//! Error types for cvxattr.

use thiserror::Error;

/// Error type for cvxattr operations.
#[derive(Debug, Error)]
pub enum CvxError {
    /// Shape mismatch.
    #[error("Shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    /// Invalid problem specification.
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),
}

/// Result type for cvxattr operations.
pub type Result<T> = std::result::Result<T, CvxError>;
