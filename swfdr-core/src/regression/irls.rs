//! Iteratively reweighted least squares.
//!
//! One routine fits both sweep regressions: the binomial/logit family
//! gives logistic regression, the gaussian/identity family collapses to
//! ordinary least squares in a single weighted solve.
//!
//! Convergence follows the usual GLM rule on the deviance:
//!   |dev - dev_old| / (|dev| + 0.1) < tol

use swfdr_linalg::{CholeskyDecomp, DenseMatrix, LinalgError};
use thiserror::Error;

use super::family::Family;
use super::link::RegressionType;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegressionError {
    #[error("IRLS did not converge after {iterations} iterations (deviance {deviance:.6e})")]
    NotConverged { iterations: usize, deviance: f64 },

    #[error("Non-finite fitted value at row {row}")]
    NonFinite { row: usize },

    #[error("Response length {response} does not match design rows {rows}")]
    LengthMismatch { response: usize, rows: usize },

    #[error("Normal equations could not be solved: {0}")]
    Linalg(#[from] LinalgError),
}

/// Configuration for the IRLS loop.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IrlsConfig {
    /// Maximum IRLS iterations.
    pub max_iter: usize,
    /// Relative deviance tolerance.
    pub tol: f64,
}

impl Default for IrlsConfig {
    fn default() -> Self {
        Self {
            max_iter: 50,
            tol: 1e-8,
        }
    }
}

/// A fitted regression.
#[derive(Debug, Clone)]
pub struct RegressionFit {
    /// Fitted values per row (probabilities for the logistic family).
    pub fitted: Vec<f64>,
    /// Coefficients, intercept first when the design carries one.
    pub coefficients: Vec<f64>,
    /// Residual deviance at the final iterate.
    pub deviance: f64,
    /// IRLS iterations used.
    pub iterations: usize,
}

/// Fits a response against a design matrix and returns fitted values.
///
/// Implementations are stateless: the λ sweep calls one backend from
/// several threads at once.
pub trait RegressionBackend: Send + Sync {
    fn fit(&self, design: &DenseMatrix, response: &[f64]) -> Result<RegressionFit, RegressionError>;
}

/// GLM backend solved by IRLS.
pub struct GlmBackend {
    family: Family,
    config: IrlsConfig,
}

impl GlmBackend {
    pub fn new(regression: RegressionType, config: IrlsConfig) -> Self {
        Self {
            family: Family::new(regression),
            config,
        }
    }
}

impl RegressionBackend for GlmBackend {
    fn fit(&self, design: &DenseMatrix, response: &[f64]) -> Result<RegressionFit, RegressionError> {
        fit_irls(response, design, &self.family, &self.config)
    }
}

/// Fit a GLM by IRLS.
///
/// # Arguments
/// - `y`: Response, length n
/// - `x`: Design matrix (n x p), including the intercept column
/// - `family`: Distribution and link
/// - `config`: Iteration limits
pub fn fit_irls(
    y: &[f64],
    x: &DenseMatrix,
    family: &Family,
    config: &IrlsConfig,
) -> Result<RegressionFit, RegressionError> {
    if y.len() != x.nrows() {
        return Err(RegressionError::LengthMismatch {
            response: y.len(),
            rows: x.nrows(),
        });
    }

    let mut mu = family.initialize_mu(y);
    let mut eta = family.link(&mu);
    let mut beta = vec![0.0; x.ncols()];
    let mut dev_old = family.deviance(y, &mu);
    let mut dev = dev_old;

    for iter in 0..config.max_iter {
        let w = family.working_weights(&mu);
        let deta = family.eta_deriv(&mu);
        // Working response z = eta + (y - mu) * d(eta)/d(mu)
        let z: Vec<f64> = eta
            .iter()
            .zip(y.iter())
            .zip(mu.iter())
            .zip(deta.iter())
            .map(|(((ei, yi), mi), di)| ei + (yi - mi) * di)
            .collect();

        let xtwx = x.xtwx(&w);
        let xtwz = x.xtwv(&w, &z);
        beta = CholeskyDecomp::new_with_ridge(&xtwx, 1e-10, 1e-4)?.solve(&xtwz);

        eta = x.mat_vec(&beta);
        mu = family.update_mu(&eta);
        dev = family.deviance(y, &mu);

        if (dev - dev_old).abs() / (dev.abs() + 0.1) < config.tol {
            if let Some(row) = mu.iter().position(|m| !m.is_finite()) {
                return Err(RegressionError::NonFinite { row });
            }
            return Ok(RegressionFit {
                fitted: mu,
                coefficients: beta,
                deviance: dev,
                iterations: iter + 1,
            });
        }
        dev_old = dev;
    }

    Err(RegressionError::NotConverged {
        iterations: config.max_iter,
        deviance: dev,
    })
}
