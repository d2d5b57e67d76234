//! Threshold sweep: one exceedance regression per λ.
//!
//! For each λ_j the response is the indicator 1[p_i > λ_j]. Its fitted
//! value is the conditional probability P(p > λ_j | x_i); dividing by
//! (1 - λ_j) turns it into the per-row π₀(λ_j) estimate the smoother
//! consumes.

use rayon::prelude::*;
use swfdr_linalg::DenseMatrix;
use tracing::{debug, info};

use crate::error::EstimationError;
use crate::regression::RegressionBackend;

/// Output of the sweep. Both matrices are m x |λ|.
#[derive(Debug, Clone)]
pub struct LambdaSweep {
    /// Fitted P(p_i > λ_j | x_i).
    pub exceedance: DenseMatrix,
    /// exceedance / (1 - λ_j).
    pub pi0_lambda: DenseMatrix,
}

/// Exceedance indicator for one threshold.
pub fn exceedance_indicator(pvalues: &[f64], lambda: f64) -> Vec<f64> {
    pvalues
        .iter()
        .map(|&p| if p > lambda { 1.0 } else { 0.0 })
        .collect()
}

/// Run the sweep.
///
/// With `covariates` absent (or column-less) every row shares the scalar
/// fraction #{p > λ_j} / m. Otherwise an intercept is prepended and
/// `backend` is fit once per λ, in parallel across λ.
///
/// Degenerate indicators (all 0 or all 1) are passed to the backend as
/// is; grids spanning the p-value range avoid them in practice.
pub fn lambda_sweep(
    pvalues: &[f64],
    covariates: Option<&DenseMatrix>,
    lambda: &[f64],
    backend: &dyn RegressionBackend,
) -> Result<LambdaSweep, EstimationError> {
    let m = pvalues.len();
    let columns: Vec<Vec<f64>> = match covariates.filter(|x| x.ncols() > 0) {
        None => lambda
            .iter()
            .map(|&l| {
                let frac = pvalues.iter().filter(|&&p| p > l).count() as f64 / m as f64;
                vec![frac; m]
            })
            .collect(),
        Some(x) => {
            if x.nrows() != m {
                return Err(EstimationError::config(format!(
                    "Design matrix has {} rows but there are {} p-values",
                    x.nrows(),
                    m
                )));
            }
            let design = x.with_intercept();
            info!(
                "Fitting {} exceedance regressions on {} rows x {} covariates",
                lambda.len(),
                m,
                x.ncols()
            );
            lambda
                .par_iter()
                .enumerate()
                .map(|(j, &l)| {
                    let y = exceedance_indicator(pvalues, l);
                    let fit = backend.fit(&design, &y).map_err(|e| EstimationError::DegenerateFit {
                        lambda_index: j,
                        lambda: l,
                        reason: e.to_string(),
                    })?;
                    debug!("lambda[{}]={:.3}: {} IRLS iterations", j, l, fit.iterations);
                    if let Some(row) = fit.fitted.iter().position(|v| !v.is_finite()) {
                        return Err(EstimationError::DegenerateFit {
                            lambda_index: j,
                            lambda: l,
                            reason: format!("non-finite prediction at row {}", row),
                        });
                    }
                    Ok(fit.fitted)
                })
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    let exceedance = DenseMatrix::from_columns(&columns);
    let mut pi0_lambda = exceedance.clone();
    for (j, &l) in lambda.iter().enumerate() {
        let scaled: Vec<f64> = columns[j].iter().map(|v| v / (1.0 - l)).collect();
        pi0_lambda.set_col(j, &scaled);
    }
    Ok(LambdaSweep {
        exceedance,
        pi0_lambda,
    })
}
