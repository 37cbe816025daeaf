//! Error types for convparity

use thiserror::Error;

/// Result type alias using convparity's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving or running a convolution
#[derive(Error, Debug)]
pub enum Error {
    /// Shape mismatch between a tensor and what the operation expects
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        got: Vec<usize>,
    },

    /// Invalid argument provided to an operation
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },
}

impl Error {
    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: &[usize], got: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }
}
