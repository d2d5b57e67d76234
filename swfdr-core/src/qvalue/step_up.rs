//! Monotone step-up transform from p-values to q-values.
//!
//! Sorted ascending, q_(i) = π₀_(i) m p_(i) / i, capped at 1, then made
//! monotone from the largest rank down with a running minimum.

use crate::error::EstimationError;
use crate::util::math::argsort_ascending;

/// Q-values with a per-instance π₀.
///
/// With `pfdr` the rank-scaled estimate is additionally divided by
/// 1 - (1 - p)^m, the positive-FDR correction.
pub fn step_up_qvalues(pvalues: &[f64], pi0: &[f64], pfdr: bool) -> Result<Vec<f64>, EstimationError> {
    if pvalues.len() != pi0.len() {
        return Err(EstimationError::config(format!(
            "{} p-values but {} pi0 values",
            pvalues.len(),
            pi0.len()
        )));
    }
    let m = pvalues.len();
    let mf = m as f64;
    let order = argsort_ascending(pvalues);

    let mut sorted_q: Vec<f64> = order
        .iter()
        .enumerate()
        .map(|(rank, &i)| {
            let p = pvalues[i];
            let mut q = pi0[i] * mf * p / (rank + 1) as f64;
            if pfdr {
                let tail = 1.0 - (1.0 - p).powf(mf);
                if tail > 0.0 {
                    q /= tail;
                }
            }
            q.min(1.0)
        })
        .collect();

    for k in (0..m.saturating_sub(1)).rev() {
        if sorted_q[k + 1] < sorted_q[k] {
            sorted_q[k] = sorted_q[k + 1];
        }
    }

    let mut qvalues = vec![0.0; m];
    for (rank, &i) in order.iter().enumerate() {
        qvalues[i] = sorted_q[rank];
    }
    Ok(qvalues)
}

/// The classical procedure: one π₀ shared by every test.
pub fn classical_qvalues(pvalues: &[f64], pi0: f64) -> Vec<f64> {
    let m = pvalues.len();
    let order = argsort_ascending(pvalues);
    let mut q = vec![0.0; m];
    let mut running = 1.0f64;
    for (rank, &i) in order.iter().enumerate().rev() {
        running = running.min(pi0 * m as f64 * pvalues[i] / (rank + 1) as f64);
        q[i] = running;
    }
    q
}
