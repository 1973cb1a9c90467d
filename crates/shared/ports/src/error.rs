use thiserror::Error;

/// Structural input errors raised by the covariance estimator
///
/// Numeric degeneracies (zero variance, perfect correlation, too few points
/// for a confidence interval) are not errors; they map to defined outputs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EstimationError {
    #[error("Insufficient data: need at least {required} samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Input mismatch: primary has {primary_len} samples, hedge has {hedge_len}")]
    InputMismatch { primary_len: usize, hedge_len: usize },
}

pub type EstimationResult<T> = std::result::Result<T, EstimationError>;
