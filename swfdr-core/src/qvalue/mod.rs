//! Q-values from a per-instance π₀.

pub mod step_up;

use swfdr_linalg::DenseMatrix;
use tracing::info;

pub use step_up::{classical_qvalues, step_up_qvalues};

use crate::error::EstimationError;
use crate::pi0::{estimate_pi0, Pi0Config, Pi0Estimate};

/// Cutoffs reported in [`QValueEstimate::significance`].
pub const SIGNIFICANCE_CUTOFFS: [f64; 7] = [0.0001, 0.001, 0.01, 0.025, 0.05, 0.1, 1.0];

/// Configuration for [`estimate_qvalues`].
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QValueConfig {
    pub pi0: Pi0Config,
    /// Use the positive-FDR correction.
    pub pfdr: bool,
}

/// Number of tests at or below a cutoff.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HitCount {
    pub cutoff: f64,
    pub pvalues: usize,
    pub qvalues: usize,
}

#[derive(Debug, Clone)]
pub struct QValueEstimate {
    pub pi0: Pi0Estimate,
    /// Input order.
    pub qvalues: Vec<f64>,
    pub significance: Vec<HitCount>,
}

/// Hit counts for p- and q-values at [`SIGNIFICANCE_CUTOFFS`].
pub fn hit_counts(pvalues: &[f64], qvalues: &[f64]) -> Vec<HitCount> {
    SIGNIFICANCE_CUTOFFS
        .iter()
        .map(|&cutoff| HitCount {
            cutoff,
            pvalues: pvalues.iter().filter(|&&p| p <= cutoff).count(),
            qvalues: qvalues.iter().filter(|&&q| q <= cutoff).count(),
        })
        .collect()
}

/// Estimate π₀(x) and turn it into q-values.
pub fn estimate_qvalues(
    pvalues: &[f64],
    covariates: Option<&DenseMatrix>,
    config: &QValueConfig,
) -> Result<QValueEstimate, EstimationError> {
    let pi0 = estimate_pi0(pvalues, covariates, &config.pi0)?;
    let qvalues = step_up_qvalues(pvalues, &pi0.pi0, config.pfdr)?;
    let significance = hit_counts(pvalues, &qvalues);
    if let Some(hits) = significance.iter().find(|h| h.cutoff == 0.05) {
        info!("{} of {} tests with q <= 0.05", hits.qvalues, pvalues.len());
    }
    Ok(QValueEstimate {
        pi0,
        qvalues,
        significance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_counts() {
        let p = [0.00005, 0.02, 0.2, 1.0];
        let q = [0.0002, 0.04, 0.4, 1.0];
        let hits = hit_counts(&p, &q);
        assert_eq!(hits.len(), 7);
        assert_eq!(hits[0], HitCount { cutoff: 0.0001, pvalues: 1, qvalues: 0 });
        assert_eq!(hits[3].pvalues, 2);
        assert_eq!(hits[3].qvalues, 1);
        assert_eq!(hits[4].qvalues, 2);
        assert_eq!(hits[6].pvalues, 4);
        assert_eq!(hits[6].qvalues, 4);
    }

    #[test]
    fn test_unconditioned_qvalues_are_classical() {
        let p: Vec<f64> = (0..300)
            .map(|i| {
                let u = (i as f64 + 0.5) / 300.0;
                if i % 3 == 0 { u * 0.01 } else { u }
            })
            .collect();
        let est = estimate_qvalues(&p, None, &QValueConfig::default()).unwrap();
        let classical = classical_qvalues(&p, est.pi0.pi0[0]);
        for (a, b) in est.qvalues.iter().zip(classical.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}
