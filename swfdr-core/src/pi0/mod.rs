//! Covariate-conditioned π₀(x) estimation.
//!
//! Two stages: [`lambda_sweep`] fits one exceedance regression per λ and
//! [`smoother`] smooths each row's π₀(λ) curve down to one value.

pub mod lambda_sweep;
pub mod smoother;

use swfdr_linalg::DenseMatrix;
use tracing::{info, warn};

pub use lambda_sweep::{lambda_sweep, LambdaSweep};
pub use smoother::{smooth_pi0, Pi0Smoothing};

use crate::error::EstimationError;
use crate::regression::{GlmBackend, IrlsConfig, RegressionType};
use crate::spline::{validate_grid, SmoothingMode, MIN_DF};

/// 0.05, 0.10, ..., 0.95
pub fn default_lambda() -> Vec<f64> {
    (1..=19).map(|i| i as f64 * 0.05).collect()
}

/// Configuration for [`estimate_pi0`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Pi0Config {
    /// Threshold grid, strictly increasing within [0, 1).
    pub lambda: Vec<f64>,
    pub regression: RegressionType,
    pub smoothing: SmoothingMode,
    /// Smoothing degrees of freedom, at least 3.
    pub smooth_df: f64,
    /// Clip π₀ to [0, 1].
    pub threshold: bool,
    pub irls: IrlsConfig,
}

impl Default for Pi0Config {
    fn default() -> Self {
        Self {
            lambda: default_lambda(),
            regression: RegressionType::default(),
            smoothing: SmoothingMode::default(),
            smooth_df: MIN_DF,
            threshold: true,
            irls: IrlsConfig::default(),
        }
    }
}

impl Pi0Config {
    pub fn validate(&self) -> Result<(), EstimationError> {
        if self.lambda.is_empty() {
            return Err(EstimationError::config("Lambda sequence is empty"));
        }
        if let Some(l) = self.lambda.iter().find(|l| !(0.0..1.0).contains(*l)) {
            return Err(EstimationError::config(format!(
                "Lambda values must lie in [0, 1), got {}",
                l
            )));
        }
        validate_grid(&self.lambda, self.smooth_df)?;
        if self.irls.max_iter == 0 || !(self.irls.tol > 0.0) {
            return Err(EstimationError::config(
                "IRLS needs at least one iteration and a positive tolerance",
            ));
        }
        Ok(())
    }
}

/// Result of [`estimate_pi0`].
#[derive(Debug, Clone)]
pub struct Pi0Estimate {
    /// One π₀ per test instance.
    pub pi0: Vec<f64>,
    /// m x |λ| raw fit matrix P(p > λ | x) / (1 - λ).
    pub pi0_lambda: DenseMatrix,
    /// The λ grid used.
    pub lambda: Vec<f64>,
    /// m x |λ| smoothed curves.
    pub pi0_smooth: DenseMatrix,
}

/// Reject empty input and anything outside [0, 1].
pub fn validate_pvalues(pvalues: &[f64]) -> Result<(), EstimationError> {
    if pvalues.is_empty() {
        return Err(EstimationError::config("No p-values supplied"));
    }
    match pvalues
        .iter()
        .position(|p| !p.is_finite() || *p < 0.0 || *p > 1.0)
    {
        Some(index) => Err(EstimationError::InvalidPValue {
            index,
            value: pvalues[index],
        }),
        None => Ok(()),
    }
}

fn validate_covariates(covariates: &DenseMatrix, m: usize) -> Result<(), EstimationError> {
    if covariates.nrows() != m {
        return Err(EstimationError::config(format!(
            "Design matrix has {} rows but there are {} p-values",
            covariates.nrows(),
            m
        )));
    }
    if let Some((row, col)) = covariates.first_non_finite() {
        return Err(EstimationError::config(format!(
            "Design matrix has a non-finite value at row {}, column {}",
            row, col
        )));
    }
    Ok(())
}

/// Estimate π₀(x_i) for every test instance.
///
/// Without covariates (or with a column-less design) the estimate is the
/// same for every row and reduces to the classical single-π₀ estimator.
pub fn estimate_pi0(
    pvalues: &[f64],
    covariates: Option<&DenseMatrix>,
    config: &Pi0Config,
) -> Result<Pi0Estimate, EstimationError> {
    config.validate()?;
    validate_pvalues(pvalues)?;
    let covariates = match covariates {
        Some(x) => {
            validate_covariates(x, pvalues.len())?;
            Some(x).filter(|x| x.ncols() > 0)
        }
        None => None,
    };
    if covariates.is_none() {
        warn!("No covariates supplied: pi0 is not conditioned and q-values match the classical procedure");
    }

    info!(
        "Estimating pi0 for {} tests over {} lambda values ({}, {})",
        pvalues.len(),
        config.lambda.len(),
        config.regression,
        config.smoothing
    );
    let backend = GlmBackend::new(config.regression, config.irls);
    let sweep = lambda_sweep(pvalues, covariates, &config.lambda, &backend)?;
    let smoothing = smooth_pi0(
        &sweep.pi0_lambda,
        &config.lambda,
        config.smoothing,
        config.smooth_df,
        config.threshold,
    )?;

    Ok(Pi0Estimate {
        pi0: smoothing.pi0,
        pi0_lambda: sweep.pi0_lambda,
        lambda: config.lambda.clone(),
        pi0_smooth: smoothing.smoothed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spread_pvalues(m: usize) -> Vec<f64> {
        (0..m).map(|i| (i as f64 + 0.5) / m as f64).collect()
    }

    #[test]
    fn test_default_config() {
        let config = Pi0Config::default();
        assert_eq!(config.lambda.len(), 19);
        assert!((config.lambda[0] - 0.05).abs() < 1e-12);
        assert!((config.lambda[18] - 0.95).abs() < 1e-12);
        assert_eq!(config.regression, RegressionType::Logistic);
        assert_eq!(config.smoothing, SmoothingMode::UnitIntervalSpline);
        assert_eq!(config.smooth_df, 3.0);
        assert!(config.threshold);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_lambda() {
        let mut config = Pi0Config::default();
        config.lambda = vec![0.1, 0.2, 0.3, 1.0];
        assert!(matches!(config.validate(), Err(EstimationError::InvalidConfiguration(_))));
        config.lambda = vec![0.1, 0.3, 0.2, 0.4, 0.5];
        assert!(config.validate().is_err());
        config.lambda = vec![0.1, 0.2, 0.3];
        assert!(config.validate().is_err());
        config.lambda = vec![];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_low_df() {
        let config = Pi0Config {
            smooth_df: 2.0,
            ..Pi0Config::default()
        };
        let p = spread_pvalues(50);
        assert!(matches!(
            estimate_pi0(&p, None, &config),
            Err(EstimationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_rejects_invalid_pvalues() {
        let config = Pi0Config::default();
        let err = estimate_pi0(&[0.1, 1.5, 0.3], None, &config).unwrap_err();
        assert_eq!(err, EstimationError::InvalidPValue { index: 1, value: 1.5 });
        assert!(matches!(
            estimate_pi0(&[0.1, f64::NAN], None, &config),
            Err(EstimationError::InvalidPValue { index: 1, .. })
        ));
        assert!(estimate_pi0(&[], None, &config).is_err());
    }

    #[test]
    fn test_rejects_bad_design() {
        let p = spread_pvalues(10);
        let config = Pi0Config::default();
        let short = DenseMatrix::zeros(9, 1);
        assert!(matches!(
            estimate_pi0(&p, Some(&short), &config),
            Err(EstimationError::InvalidConfiguration(_))
        ));
        let mut nan = DenseMatrix::zeros(10, 2);
        nan.set(4, 1, f64::INFINITY);
        assert!(matches!(
            estimate_pi0(&p, Some(&nan), &config),
            Err(EstimationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_uniform_pvalues_give_pi0_near_one() {
        let p = spread_pvalues(400);
        let est = estimate_pi0(&p, None, &Pi0Config::default()).unwrap();
        assert_eq!(est.pi0.len(), 400);
        assert_eq!(est.pi0_lambda.nrows(), 400);
        assert_eq!(est.pi0_lambda.ncols(), 19);
        assert_eq!(est.pi0_smooth.ncols(), 19);
        // Every row shares the same estimate
        assert!(est.pi0.iter().all(|&v| (v - est.pi0[0]).abs() < 1e-12));
        assert!(est.pi0[0] > 0.95, "pi0={}", est.pi0[0]);
    }

    #[test]
    fn test_column_less_design_matches_no_design() {
        let p = spread_pvalues(100);
        let config = Pi0Config::default();
        let a = estimate_pi0(&p, None, &config).unwrap();
        let b = estimate_pi0(&p, Some(&DenseMatrix::zeros(100, 0)), &config).unwrap();
        assert_eq!(a.pi0, b.pi0);
    }
}
