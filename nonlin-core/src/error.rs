//! Error types shared across the solver.

use thiserror::Error;

/// Errors raised while evaluating the model oracle.
///
/// These are recoverable: the globalization mechanism reacts by rejecting the
/// trial point and shrinking the step.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationError {
    /// The oracle returned NaN or an unexpected infinity
    #[error("function evaluation returned a non-finite value")]
    NonFiniteValue,
}

/// Errors raised by the symmetric indefinite linear solver.
#[derive(Error, Debug)]
pub enum LinearSolverError {
    /// The matrix could not be factorized, even with regularization
    #[error("factorization failed: matrix is numerically singular")]
    NumericalSingular,

    /// A preallocated workspace is too small for the matrix
    #[error("insufficient workspace: expected at most {expected}, got {actual}")]
    InsufficientWorkspace {
        /// Preallocated capacity
        expected: usize,
        /// Requested size
        actual: usize,
    },

    /// Dimension mismatch between the matrix and a right-hand side
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },
}

/// Unrecoverable solver failures. These propagate to the driver, which logs
/// them and returns an `Error` result.
#[derive(Error, Debug)]
pub enum SolverError {
    /// The inertia correction diverged (primal regularization above 1e40)
    #[error("the inertia correction got unstable (delta_w > 1e40)")]
    UnstableInertiaCorrection,

    /// An option value failed validation
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// The model failed validation (inconsistent dimensions or bounds)
    #[error("invalid model: {0}")]
    InvalidModel(String),

    /// Internal error that indicates a bug rather than a problem property
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for driver-level operations.
pub type SolverResult<T> = Result<T, SolverError>;
