//! Error types for model construction, training and scoring.

use thiserror::Error;

/// Errors returned at the boundary of the crate.
///
/// Numeric kernels (backend operations, objective evaluation) do not return
/// errors: their inputs are validated here first.
#[derive(Debug, Error)]
pub enum LogitError {
    /// Two inputs that must agree in size do not.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// An explicit starting point does not match `features + 1`.
    #[error("initial point has {got} elements, expected {expected} (features + 1)")]
    InitialPointMismatch { expected: usize, got: usize },

    /// A response is neither 0 nor 1.
    #[error("label at index {index} is {value}, expected 0 or 1")]
    InvalidLabel { index: usize, value: f64 },

    /// The operation needs at least one observation.
    #[error("dataset contains no observations")]
    EmptyDataset,

    /// Invalid hyperparameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// I/O error during model persistence.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding of persisted parameters failed.
    #[cfg(feature = "serde")]
    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, LogitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_dimension_mismatch() {
        let err = LogitError::DimensionMismatch {
            expected: 4,
            got: 3,
        };
        assert_eq!(err.to_string(), "dimension mismatch: expected 4, got 3");
    }

    #[test]
    fn test_display_invalid_label() {
        let err = LogitError::InvalidLabel {
            index: 2,
            value: 0.5,
        };
        assert_eq!(err.to_string(), "label at index 2 is 0.5, expected 0 or 1");
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: LogitError = io.into();
        assert!(matches!(err, LogitError::Io(_)));
    }
}
