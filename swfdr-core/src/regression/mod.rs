//! Regression backend for the λ sweep.
//!
//! Fits one GLM per threshold: logistic regression of the exceedance
//! indicator by default, or ordinary least squares on the same indicator.

pub mod family;
pub mod irls;
pub mod link;

pub use irls::{GlmBackend, IrlsConfig, RegressionBackend, RegressionError, RegressionFit};
pub use link::RegressionType;
