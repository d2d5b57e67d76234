//! Cubic smoothing spline (Reinsch form).
//!
//! Minimizes  sum_i (y_i - g(x_i))^2 + rho * int g''(t)^2 dt  over natural
//! cubic splines with knots at the data points. With
//!   Q: n x (n-2) second-difference matrix,
//!   R: (n-2) x (n-2) tridiagonal band matrix,
//! the fit solves (R + rho Q'Q) gamma = Q'y and sets g = y - rho Q gamma,
//! where gamma holds the second derivatives at the interior knots.
//!
//! rho is chosen so that the smoother matrix
//!   S(rho) = I - rho Q (R + rho Q'Q)^{-1} Q'
//! has trace equal to the requested degrees of freedom.
//!
//! Reference: Green & Silverman (1994), ch. 2.

use swfdr_linalg::{CholeskyDecomp, DenseMatrix};
use tracing::trace;

use super::{validate_grid, SplineSmoother};
use crate::error::EstimationError;

/// Bisection steps on log10(rho).
const MAX_SEARCH_STEPS: usize = 80;
/// Accepted |df(rho) - target|.
const DF_TOL: f64 = 1e-7;

/// Reinsch matrices for a fixed, strictly increasing grid.
#[derive(Debug, Clone)]
pub(super) struct ReinschSystem {
    q: DenseMatrix,
    r: DenseMatrix,
    qtq: DenseMatrix,
    /// tr(R) / tr(Q'Q): puts rho on a scale-free footing.
    rho_scale: f64,
}

impl ReinschSystem {
    pub(super) fn new(x: &[f64]) -> Self {
        let n = x.len();
        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        let mut q = DenseMatrix::zeros(n, n - 2);
        let mut r = DenseMatrix::zeros(n - 2, n - 2);
        for k in 0..n - 2 {
            q.set(k, k, 1.0 / h[k]);
            q.set(k + 1, k, -1.0 / h[k] - 1.0 / h[k + 1]);
            q.set(k + 2, k, 1.0 / h[k + 1]);
            r.set(k, k, (h[k] + h[k + 1]) / 3.0);
            if k + 1 < n - 2 {
                r.set(k, k + 1, h[k + 1] / 6.0);
                r.set(k + 1, k, h[k + 1] / 6.0);
            }
        }
        let qtq = q.transpose().mat_mul(&q);
        let rho_scale = r.trace() / qtq.trace();
        Self {
            q,
            r,
            qtq,
            rho_scale,
        }
    }

    fn system(&self, rho: f64) -> Result<CholeskyDecomp, EstimationError> {
        let m = self.r.nrows();
        let mut a = self.r.clone();
        for i in 0..m {
            for j in 0..m {
                a.set(i, j, a.get(i, j) + rho * self.qtq.get(i, j));
            }
        }
        Ok(CholeskyDecomp::new(&a)?)
    }

    /// Trace of the smoother matrix at rho.
    pub(super) fn df(&self, rho: f64) -> Result<f64, EstimationError> {
        let n = self.q.nrows();
        let chol = self.system(rho)?;
        // tr((R + rho Q'Q)^{-1} Q'Q), one column of Q'Q at a time
        let m = self.qtq.ncols();
        let mut tr = 0.0;
        for j in 0..m {
            let col = chol.solve(&self.qtq.col(j));
            tr += col[j];
        }
        Ok(n as f64 - rho * tr)
    }

    /// Smoothing parameter whose smoother trace matches `target_df`.
    pub(super) fn rho_for_df(&self, target_df: f64) -> Result<f64, EstimationError> {
        let rho_at = |s: f64| self.rho_scale * 10f64.powf(s);
        let (mut lo, mut hi) = (-6.0, 6.0);
        // df decreases in rho: widen until the target is bracketed
        for _ in 0..10 {
            if self.df(rho_at(lo))? >= target_df {
                break;
            }
            lo -= 3.0;
        }
        for _ in 0..10 {
            if self.df(rho_at(hi))? <= target_df {
                break;
            }
            hi += 3.0;
        }

        let mut mid = 0.5 * (lo + hi);
        for step in 0..MAX_SEARCH_STEPS {
            mid = 0.5 * (lo + hi);
            let df = self.df(rho_at(mid))?;
            if (df - target_df).abs() < DF_TOL {
                trace!("df search converged after {} steps", step + 1);
                break;
            }
            if df > target_df {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        Ok(rho_at(mid))
    }

    /// S(rho) as an explicit n x n matrix.
    pub(super) fn smoother_matrix(&self, rho: f64) -> Result<DenseMatrix, EstimationError> {
        let n = self.q.nrows();
        let chol = self.system(rho)?;
        // (R + rho Q'Q)^{-1} Q', one column of Q' per grid point
        let solved: Vec<Vec<f64>> = (0..n).map(|i| chol.solve(&self.q.row(i))).collect();
        let q_solved = self.q.mat_mul(&DenseMatrix::from_columns(&solved));
        let mut s = DenseMatrix::zeros(n, n);
        for i in 0..n {
            for j in 0..n {
                let delta = if i == j { 1.0 } else { 0.0 };
                s.set(i, j, delta - rho * q_solved.get(i, j));
            }
        }
        Ok(s)
    }

    fn fit(&self, chol: &CholeskyDecomp, y: &[f64], rho: f64) -> (Vec<f64>, Vec<f64>) {
        let qty = self.q.transpose().mat_vec(y);
        let gamma_inner = chol.solve(&qty);
        let q_gamma = self.q.mat_vec(&gamma_inner);
        let fitted: Vec<f64> = y
            .iter()
            .zip(q_gamma.iter())
            .map(|(yi, qg)| yi - rho * qg)
            .collect();

        let mut gamma = Vec::with_capacity(y.len());
        gamma.push(0.0);
        gamma.extend_from_slice(&gamma_inner);
        gamma.push(0.0);
        (fitted, gamma)
    }
}

/// A fitted natural cubic smoothing spline.
#[derive(Debug, Clone)]
pub struct SmoothingSplineFit {
    /// Knots (the input grid).
    pub x: Vec<f64>,
    /// Fitted values at the knots.
    pub fitted: Vec<f64>,
    /// Second derivatives at the knots; zero at both ends.
    pub gamma: Vec<f64>,
    /// Smoothing parameter used.
    pub rho: f64,
    /// Trace of the smoother matrix at `rho`.
    pub df: f64,
}

impl SmoothingSplineFit {
    /// Evaluate the spline at `t`. Outside the knot range the natural
    /// spline continues linearly.
    pub fn predict(&self, t: f64) -> f64 {
        let n = self.x.len();
        let (x, g, gamma) = (&self.x, &self.fitted, &self.gamma);
        if t <= x[0] {
            let h = x[1] - x[0];
            let slope = (g[1] - g[0]) / h - h * gamma[1] / 6.0;
            return g[0] + (t - x[0]) * slope;
        }
        if t >= x[n - 1] {
            let h = x[n - 1] - x[n - 2];
            let slope = (g[n - 1] - g[n - 2]) / h + h * gamma[n - 2] / 6.0;
            return g[n - 1] + (t - x[n - 1]) * slope;
        }
        let i = x.partition_point(|&xi| xi <= t) - 1;
        let h = x[i + 1] - x[i];
        let (a, b) = (t - x[i], x[i + 1] - t);
        (a * g[i + 1] + b * g[i]) / h
            - a * b / 6.0 * ((1.0 + a / h) * gamma[i + 1] + (1.0 + b / h) * gamma[i])
    }
}

/// Fit a smoothing spline with `df` effective degrees of freedom.
pub fn smooth_spline(x: &[f64], y: &[f64], df: f64) -> Result<SmoothingSplineFit, EstimationError> {
    SmoothingSpline::new(x, df)?.fit(y)
}

/// General-purpose smoother: every curve gets its own fit. The Reinsch
/// system and the smoothing parameter depend only on the grid and are
/// computed once.
#[derive(Debug, Clone)]
pub struct SmoothingSpline {
    x: Vec<f64>,
    rho: f64,
    df: f64,
    chol: CholeskyDecomp,
    system: ReinschSystem,
}

impl SmoothingSpline {
    pub fn new(x: &[f64], df: f64) -> Result<Self, EstimationError> {
        validate_grid(x, df)?;
        let system = ReinschSystem::new(x);
        let rho = system.rho_for_df(df)?;
        let achieved = system.df(rho)?;
        let chol = system.system(rho)?;
        Ok(Self {
            x: x.to_vec(),
            rho,
            df: achieved,
            chol,
            system,
        })
    }

    /// Fit one curve sampled on the grid.
    pub fn fit(&self, y: &[f64]) -> Result<SmoothingSplineFit, EstimationError> {
        if y.len() != self.x.len() {
            return Err(EstimationError::config(format!(
                "Curve length {} does not match grid length {}",
                y.len(),
                self.x.len()
            )));
        }
        let (fitted, gamma) = self.system.fit(&self.chol, y, self.rho);
        Ok(SmoothingSplineFit {
            x: self.x.clone(),
            fitted,
            gamma,
            rho: self.rho,
            df: self.df,
        })
    }
}

impl SplineSmoother for SmoothingSpline {
    fn smooth(&self, y: &[f64]) -> Result<Vec<f64>, EstimationError> {
        Ok(self.fit(y)?.fitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Vec<f64> {
        (1..=19).map(|i| i as f64 * 0.05).collect()
    }

    #[test]
    fn test_reproduces_linear_curves() {
        let x = grid();
        let y: Vec<f64> = x.iter().map(|&v| 0.9 - 0.3 * v).collect();
        let fit = smooth_spline(&x, &y, 3.0).unwrap();
        for (f, t) in fit.fitted.iter().zip(y.iter()) {
            assert!((f - t).abs() < 1e-9, "{} vs {}", f, t);
        }
        assert!((fit.predict(1.0) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_df_is_matched() {
        let x = grid();
        let y: Vec<f64> = x.iter().map(|&v| (6.0 * v).sin()).collect();
        for &df in &[3.0, 5.0, 10.0] {
            let fit = smooth_spline(&x, &y, df).unwrap();
            assert!((fit.df - df).abs() < 1e-5, "requested {}, got {}", df, fit.df);
        }
    }

    #[test]
    fn test_more_df_tracks_data_closer() {
        let x = grid();
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, &v)| v * v + if i % 2 == 0 { 0.05 } else { -0.05 })
            .collect();
        let rss = |df: f64| {
            let fit = smooth_spline(&x, &y, df).unwrap();
            fit.fitted.iter().zip(y.iter()).map(|(f, t)| (f - t).powi(2)).sum::<f64>()
        };
        assert!(rss(8.0) < rss(3.0));
    }

    #[test]
    fn test_predict_interpolates_fitted_values() {
        let x = grid();
        let y: Vec<f64> = x.iter().map(|&v| (1.0 - v).powi(2)).collect();
        let fit = smooth_spline(&x, &y, 4.0).unwrap();
        for (i, &xi) in x.iter().enumerate() {
            assert!((fit.predict(xi) - fit.fitted[i]).abs() < 1e-10);
        }
        // Continuous between knots
        let mid = fit.predict(0.525);
        assert!(mid.is_finite());
        assert!((mid - 0.5 * (fit.fitted[9] + fit.fitted[10])).abs() < 0.01);
    }

    #[test]
    fn test_rejects_low_df_and_short_grid() {
        let x = grid();
        let y = vec![1.0; x.len()];
        assert!(matches!(
            smooth_spline(&x, &y, 2.5),
            Err(EstimationError::InvalidConfiguration(_))
        ));
        let short = [0.1, 0.2, 0.3];
        assert!(matches!(
            smooth_spline(&short, &[1.0, 1.0, 1.0], 3.0),
            Err(EstimationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_cached_fit_matches_one_shot_fit() {
        let x = grid();
        let spline = SmoothingSpline::new(&x, 4.0).unwrap();
        for shift in [0.0, 0.3, -1.2] {
            let y: Vec<f64> = x.iter().map(|&v| (5.0 * v + shift).sin()).collect();
            let cached = spline.smooth(&y).unwrap();
            let fresh = smooth_spline(&x, &y, 4.0).unwrap();
            assert_eq!(spline.rho, fresh.rho);
            for (a, b) in cached.iter().zip(fresh.fitted.iter()) {
                assert!((a - b).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_smoother_matrix_matches_fit() {
        let x = grid();
        let system = ReinschSystem::new(&x);
        let rho = system.rho_for_df(3.0).unwrap();
        let s = system.smoother_matrix(rho).unwrap();
        assert!((s.trace() - 3.0).abs() < 1e-5);
        let y: Vec<f64> = x.iter().enumerate().map(|(i, &v)| v * v + 0.02 * (i % 3) as f64).collect();
        let direct = smooth_spline(&x, &y, 3.0).unwrap().fitted;
        let applied = s.mat_vec(&y);
        for (a, b) in applied.iter().zip(direct.iter()) {
            assert!((a - b).abs() < 1e-10);
        }
    }

    #[test]
    fn test_curve_length_mismatch() {
        let x = grid();
        assert!(smooth_spline(&x, &[1.0, 2.0], 3.0).is_err());
        assert!(SmoothingSpline::new(&x, 3.0).unwrap().smooth(&[1.0]).is_err());
    }
}
