//! swfdr-linalg: Linear algebra wrappers for swfdr-rs
//!
//! Provides the dense matrix type and the Cholesky decomposition used by
//! the regression backend and the spline smoothers.

pub mod dense;
pub mod decomposition;

pub use decomposition::{CholeskyDecomp, LinalgError};
pub use dense::DenseMatrix;
