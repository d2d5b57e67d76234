//! Error taxonomy shared by the estimators.

use swfdr_linalg::LinalgError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EstimationError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid p-value at index {index}: {value}")]
    InvalidPValue { index: usize, value: f64 },

    #[error("Regression at lambda[{lambda_index}] = {lambda:.4} failed: {reason}")]
    DegenerateFit {
        lambda_index: usize,
        lambda: f64,
        reason: String,
    },

    #[error("EM iteration {iteration} failed: {reason}")]
    EmFailure { iteration: usize, reason: String },

    #[error(transparent)]
    Linalg(#[from] LinalgError),
}

impl EstimationError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        EstimationError::InvalidConfiguration(msg.into())
    }
}
