//! Second stage of the π₀ pipeline: smooth every row of the π₀(λ) matrix
//! over the λ grid and read the curve at the largest λ.

use swfdr_linalg::DenseMatrix;
use tracing::debug;

use crate::error::EstimationError;
use crate::spline::SmoothingMode;
use crate::util::math::clamp_unit;

/// Smoothed curves and the per-row π₀ read from them.
#[derive(Debug, Clone)]
pub struct Pi0Smoothing {
    /// m x |λ| smoothed π₀(λ) curves.
    pub smoothed: DenseMatrix,
    /// One value per row.
    pub pi0: Vec<f64>,
}

/// Smooth `pi0_lambda` row by row.
///
/// With `threshold` set every π₀ is clipped to [0, 1]; otherwise the
/// smoothed value at the largest λ is returned unchanged.
pub fn smooth_pi0(
    pi0_lambda: &DenseMatrix,
    lambda: &[f64],
    mode: SmoothingMode,
    df: f64,
    threshold: bool,
) -> Result<Pi0Smoothing, EstimationError> {
    if pi0_lambda.ncols() != lambda.len() {
        return Err(EstimationError::config(format!(
            "Fit matrix has {} columns but the lambda grid has {} values",
            pi0_lambda.ncols(),
            lambda.len()
        )));
    }
    let smoother = mode.build(lambda, df)?;
    debug!("Smoothing {} curves ({} mode, df={})", pi0_lambda.nrows(), mode, df);
    let smoothed = smoother.smooth_rows(pi0_lambda)?;

    let top = lambda.len() - 1;
    let pi0 = (0..smoothed.nrows())
        .map(|i| {
            let v = smoothed.get(i, top);
            if threshold {
                clamp_unit(v)
            } else {
                v
            }
        })
        .collect();
    Ok(Pi0Smoothing { smoothed, pi0 })
}
