#![allow(clippy::needless_range_loop)]
//! Matrix decompositions.
//!
//! Cholesky for the IRLS normal equations and the Reinsch smoothing-spline
//! system.

use crate::dense::DenseMatrix;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinalgError {
    #[error("Matrix is not positive definite (pivot {pivot}: {value:.3e})")]
    NotPositiveDefinite { pivot: usize, value: f64 },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Cholesky factor L of a symmetric positive definite matrix, A = L L'.
#[derive(Debug, Clone)]
pub struct CholeskyDecomp {
    pub l: DenseMatrix,
}

impl CholeskyDecomp {
    pub fn new(a: &DenseMatrix) -> Result<Self, LinalgError> {
        let n = a.nrows();
        if n != a.ncols() {
            return Err(LinalgError::DimensionMismatch {
                expected: n,
                got: a.ncols(),
            });
        }
        let mut l = DenseMatrix::zeros(n, n);

        for j in 0..n {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l.get(j, k) * l.get(j, k);
            }
            let diag = a.get(j, j) - sum;
            if diag <= 0.0 || !diag.is_finite() {
                return Err(LinalgError::NotPositiveDefinite {
                    pivot: j,
                    value: diag,
                });
            }
            l.set(j, j, diag.sqrt());

            for i in (j + 1)..n {
                let mut sum = 0.0;
                for k in 0..j {
                    sum += l.get(i, k) * l.get(j, k);
                }
                l.set(i, j, (a.get(i, j) - sum) / l.get(j, j));
            }
        }

        Ok(CholeskyDecomp { l })
    }

    /// Factor `a + ridge * I`, retrying with a larger ridge when the plain
    /// factorization fails. Gives up after the ridge exceeds `max_ridge`.
    pub fn new_with_ridge(a: &DenseMatrix, ridge: f64, max_ridge: f64) -> Result<Self, LinalgError> {
        match Self::new(a) {
            Ok(chol) => Ok(chol),
            Err(err) => {
                let scale = (a.trace().abs() / a.nrows().max(1) as f64).max(1.0);
                let mut eps = ridge;
                while eps <= max_ridge {
                    let mut reg = a.clone();
                    for i in 0..reg.nrows() {
                        reg.set(i, i, reg.get(i, i) + eps * scale);
                    }
                    if let Ok(chol) = Self::new(&reg) {
                        return Ok(chol);
                    }
                    eps *= 10.0;
                }
                Err(err)
            }
        }
    }

    /// Solve L L' x = b.
    pub fn solve(&self, b: &[f64]) -> Vec<f64> {
        let n = self.l.nrows();
        assert_eq!(b.len(), n);

        let mut y = vec![0.0; n];
        for i in 0..n {
            let mut sum = 0.0;
            for j in 0..i {
                sum += self.l.get(i, j) * y[j];
            }
            y[i] = (b[i] - sum) / self.l.get(i, i);
        }

        let mut x = vec![0.0; n];
        for i in (0..n).rev() {
            let mut sum = 0.0;
            for j in (i + 1)..n {
                sum += self.l.get(j, i) * x[j];
            }
            x[i] = (y[i] - sum) / self.l.get(i, i);
        }

        x
    }
}
