//! Smoothing spline as a precomputed linear operator on the unit interval.
//!
//! Every row of the π₀(λ) matrix is sampled on the same λ grid and the
//! df-matched smoothing parameter depends only on that grid. The fitted
//! values are therefore one linear map of the curve:
//!   smoothed = S y,   S = I - rho Q (R + rho Q'Q)^{-1} Q'
//! S is built once on the grid rescaled to [0, 1] and applied to all rows
//! as a single matrix product.
//!
//! Rescaling the grid by c rescales the df-matched rho by c^3 and leaves S
//! unchanged, so this mode reproduces the per-curve smoothing spline.

use swfdr_linalg::DenseMatrix;
use tracing::debug;

use super::smoothing::ReinschSystem;
use super::{validate_grid, SplineSmoother};
use crate::error::EstimationError;

/// Precomputed smoother matrix for a fixed grid.
#[derive(Debug, Clone)]
pub struct UnitIntervalSpline {
    hat: DenseMatrix,
}

impl UnitIntervalSpline {
    pub fn new(x: &[f64], df: f64) -> Result<Self, EstimationError> {
        validate_grid(x, df)?;
        let n = x.len();
        let (lo, hi) = (x[0], x[n - 1]);
        let grid: Vec<f64> = x.iter().map(|&v| (v - lo) / (hi - lo)).collect();

        let system = ReinschSystem::new(&grid);
        let rho = system.rho_for_df(df)?;
        let hat = system.smoother_matrix(rho)?;
        debug!("unit-interval smoother: rho={:.4e}, trace={:.6}", rho, hat.trace());
        Ok(Self { hat })
    }
}

impl SplineSmoother for UnitIntervalSpline {
    fn smooth(&self, y: &[f64]) -> Result<Vec<f64>, EstimationError> {
        if y.len() != self.hat.ncols() {
            return Err(EstimationError::config(format!(
                "Curve length {} does not match grid length {}",
                y.len(),
                self.hat.ncols()
            )));
        }
        Ok(self.hat.mat_vec(y))
    }

    fn smooth_rows(&self, curves: &DenseMatrix) -> Result<DenseMatrix, EstimationError> {
        if curves.ncols() != self.hat.ncols() {
            return Err(EstimationError::config(format!(
                "Curve length {} does not match grid length {}",
                curves.ncols(),
                self.hat.ncols()
            )));
        }
        // Rows are curves: (S Y')' = Y S'
        Ok(curves.mat_mul(&self.hat.transpose()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spline::SmoothingSpline;

    fn grid() -> Vec<f64> {
        (1..=19).map(|i| i as f64 * 0.05).collect()
    }

    #[test]
    fn test_hat_trace_is_df() {
        for &df in &[3.0, 4.0, 6.5] {
            let s = UnitIntervalSpline::new(&grid(), df).unwrap();
            assert!((s.hat.trace() - df).abs() < 1e-5, "trace {}", s.hat.trace());
            assert_eq!(s.hat.nrows(), 19);
        }
    }

    #[test]
    fn test_reproduces_linear_curves() {
        let x = grid();
        let y: Vec<f64> = x.iter().map(|&v| 0.2 + 0.7 * v).collect();
        let s = UnitIntervalSpline::new(&x, 3.0).unwrap();
        let fitted = s.smooth(&y).unwrap();
        for (f, t) in fitted.iter().zip(y.iter()) {
            assert!((f - t).abs() < 1e-9);
        }
    }

    #[test]
    fn test_matches_general_spline_on_rough_curves() {
        let x = grid();
        let unit = UnitIntervalSpline::new(&x, 3.0).unwrap();
        let general = SmoothingSpline::new(&x, 3.0).unwrap();
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, &v)| 0.8 + 0.1 * (11.0 * v).sin() + if i % 2 == 0 { 0.04 } else { -0.03 })
            .collect();
        let a = unit.smooth(&y).unwrap();
        let b = general.smooth(&y).unwrap();
        for (u, g) in a.iter().zip(b.iter()) {
            assert!((u - g).abs() < 1e-6, "{} vs {}", u, g);
        }
    }

    #[test]
    fn test_smooth_rows_matches_per_row() {
        let x = grid();
        let s = UnitIntervalSpline::new(&x, 3.0).unwrap();
        let rows: Vec<Vec<f64>> = (0..4)
            .map(|r| x.iter().map(|&v| (r as f64 + 1.0) * (v * 5.0).cos()).collect())
            .collect();
        let curves = DenseMatrix::from_rows(&rows);
        let smoothed = s.smooth_rows(&curves).unwrap();
        for (i, row) in rows.iter().enumerate() {
            let single = s.smooth(row).unwrap();
            for j in 0..x.len() {
                assert!((smoothed.get(i, j) - single[j]).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_rejects_bad_lengths() {
        let s = UnitIntervalSpline::new(&grid(), 3.0).unwrap();
        assert!(s.smooth(&[1.0, 2.0]).is_err());
        assert!(s.smooth_rows(&DenseMatrix::zeros(2, 5)).is_err());
    }
}
