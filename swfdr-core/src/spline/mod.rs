//! One-dimensional smoothers for per-row π₀(λ) curves.
//!
//! Two interchangeable modes share the [`SplineSmoother`] interface:
//! - [`SmoothingSpline`]: a cubic smoothing spline solved per curve
//! - [`UnitIntervalSpline`]: the same smoother as an explicit matrix,
//!   computed once for the shared grid and applied to all rows at once

pub mod smoothing;
pub mod unit_interval;

use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use swfdr_linalg::DenseMatrix;

pub use smoothing::{smooth_spline, SmoothingSpline, SmoothingSplineFit};
pub use unit_interval::UnitIntervalSpline;

use crate::error::EstimationError;

/// Lowest accepted smoothing degrees of freedom.
pub const MIN_DF: f64 = 3.0;

/// Smooths one curve sampled on a fixed grid, returning the smoothed
/// values at the same grid points.
pub trait SplineSmoother: Send + Sync {
    fn smooth(&self, y: &[f64]) -> Result<Vec<f64>, EstimationError>;

    /// Smooth every row of `curves` (one curve per row). Rows are fitted
    /// in parallel; each writes only its own output row.
    fn smooth_rows(&self, curves: &DenseMatrix) -> Result<DenseMatrix, EstimationError> {
        let rows = (0..curves.nrows())
            .into_par_iter()
            .map(|i| self.smooth(&curves.row(i)))
            .collect::<Result<Vec<_>, _>>()?;
        if rows.is_empty() {
            return Ok(DenseMatrix::zeros(0, curves.ncols()));
        }
        Ok(DenseMatrix::from_rows(&rows))
    }
}

/// Which smoother the π₀ pipeline uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SmoothingMode {
    /// Independent smoothing spline per row.
    GeneralSpline,
    /// Precomputed smoother matrix shared by all rows.
    #[default]
    UnitIntervalSpline,
}

impl SmoothingMode {
    /// Build the smoother for a grid.
    pub fn build(self, x: &[f64], df: f64) -> Result<Box<dyn SplineSmoother>, EstimationError> {
        Ok(match self {
            SmoothingMode::GeneralSpline => Box::new(SmoothingSpline::new(x, df)?),
            SmoothingMode::UnitIntervalSpline => Box::new(UnitIntervalSpline::new(x, df)?),
        })
    }
}

impl fmt::Display for SmoothingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmoothingMode::GeneralSpline => write!(f, "general-spline"),
            SmoothingMode::UnitIntervalSpline => write!(f, "unit-interval-spline"),
        }
    }
}

impl FromStr for SmoothingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "general-spline" | "smooth.spline" | "general" => Ok(SmoothingMode::GeneralSpline),
            "unit-interval-spline" | "unit.spline" | "unit" => Ok(SmoothingMode::UnitIntervalSpline),
            other => Err(format!("Unknown smoothing mode: {}", other)),
        }
    }
}

/// Check a smoothing grid: finite, strictly increasing, longer than `df`,
/// and `df` at or above the floor.
pub fn validate_grid(x: &[f64], df: f64) -> Result<(), EstimationError> {
    if !df.is_finite() || df < MIN_DF {
        return Err(EstimationError::config(format!(
            "Smoothing degrees of freedom must be at least {}, got {}",
            MIN_DF, df
        )));
    }
    if (x.len() as f64) <= df {
        return Err(EstimationError::config(format!(
            "Grid of length {} is too short for {} degrees of freedom",
            x.len(),
            df
        )));
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(EstimationError::config("Grid contains non-finite values"));
    }
    if x.windows(2).any(|w| w[1] <= w[0]) {
        return Err(EstimationError::config("Grid must be strictly increasing"));
    }
    Ok(())
}
