//! Error types for the maglev model.
//!
//! Every fallible operation in the crate returns [`Result<T>`].

use thiserror::Error;

/// Unified error type for model building and analysis.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MaglevError {
    /// The physics has no real solution for the given inputs
    /// (e.g. a negative squared equilibrium current).
    #[error("Domain error: {0}")]
    Domain(String),

    /// A physical constant or run parameter is out of its valid range.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Simulation horizon is not positive or too few samples were requested.
    #[error("Invalid horizon: horizon = {horizon}, sample_count = {sample_count}")]
    InvalidHorizon {
        /// Requested horizon (s)
        horizon: f64,
        /// Requested number of samples
        sample_count: usize,
    },

    /// State-space matrices are not conformable.
    #[error("Dimension mismatch in {matrix}: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        /// Name of the offending matrix
        matrix: &'static str,
        /// Shape required by the other matrices
        expected: (usize, usize),
        /// Shape received
        actual: (usize, usize),
    },
}

/// Convenience alias for `Result<T, MaglevError>`.
pub type Result<T> = std::result::Result<T, MaglevError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizon_message() {
        let err = MaglevError::InvalidHorizon { horizon: -1.0, sample_count: 10 };
        assert_eq!(err.to_string(), "Invalid horizon: horizon = -1, sample_count = 10");
    }

    #[test]
    fn test_dimension_message() {
        let err = MaglevError::DimensionMismatch {
            matrix: "B",
            expected: (3, 1),
            actual: (2, 1),
        };
        assert!(err.to_string().contains("B"));
        assert!(err.to_string().contains("(3, 1)"));
    }
}
