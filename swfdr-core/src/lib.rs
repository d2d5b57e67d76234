//! swfdr-core: Statistical algorithms for swfdr-rs
//!
//! Estimates the probability that each null hypothesis is true, optionally
//! conditioned on per-test covariates, turns those estimates into q-values,
//! and fits the censored two-component mixture behind the science-wise
//! false discovery rate.

pub mod censored;
pub mod error;
pub mod pi0;
pub mod qvalue;
pub mod regression;
pub mod spline;
pub mod util;

pub use censored::{estimate_swfdr, EmConfig, MixtureState, SwfdrEstimate};
pub use error::EstimationError;
pub use pi0::{estimate_pi0, Pi0Config, Pi0Estimate};
pub use qvalue::{estimate_qvalues, QValueConfig, QValueEstimate};
pub use regression::RegressionType;
pub use spline::SmoothingMode;
