//! Science-wise false discovery rate from censored published p-values.
//!
//! EM over a uniform-null / truncated-Beta-alternative mixture on the
//! reporting window, with truncated and rounded p-values entering through
//! their censored likelihoods.

pub mod corpus;
pub mod mixture;

use tracing::{debug, info};

pub use corpus::{bin_index, CensoredCorpus, Observation, BIN_EDGES, N_BINS, WINDOW};
pub use mixture::{BfgsConfig, MixtureState, Posterior, TruncatedBeta};

use crate::error::EstimationError;

/// Configuration for [`estimate_swfdr`].
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EmConfig {
    /// Starting mixing proportion, in (0, 1).
    pub pi0: f64,
    /// Starting Beta shapes, positive.
    pub alpha: f64,
    pub beta: f64,
    /// Maximum EM iterations.
    pub iterations: usize,
    /// Stop once no parameter moves by more than this.
    pub tol: Option<f64>,
    pub optimizer: BfgsConfig,
}

impl Default for EmConfig {
    fn default() -> Self {
        let start = MixtureState::default();
        Self {
            pi0: start.pi0,
            alpha: start.alpha,
            beta: start.beta,
            iterations: 100,
            tol: None,
            optimizer: BfgsConfig::default(),
        }
    }
}

impl EmConfig {
    pub fn validate(&self) -> Result<(), EstimationError> {
        if !(self.pi0 > 0.0 && self.pi0 < 1.0) {
            return Err(EstimationError::config(format!(
                "Starting pi0 must lie in (0, 1), got {}",
                self.pi0
            )));
        }
        if !(self.alpha > 0.0 && self.alpha.is_finite() && self.beta > 0.0 && self.beta.is_finite()) {
            return Err(EstimationError::config(format!(
                "Starting Beta shapes must be positive and finite, got ({}, {})",
                self.alpha, self.beta
            )));
        }
        if let Some(tol) = self.tol {
            if !(tol > 0.0) {
                return Err(EstimationError::config(format!("Tolerance must be positive, got {}", tol)));
            }
        }
        if !(self.optimizer.tolerance > 0.0) || self.optimizer.max_iterations == 0 {
            return Err(EstimationError::config("Optimizer needs a positive tolerance and iteration limit"));
        }
        Ok(())
    }

    fn start(&self) -> MixtureState {
        MixtureState {
            pi0: self.pi0,
            alpha: self.alpha,
            beta: self.beta,
        }
    }
}

/// Rounded observations in one bin against the expected null share.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BinSummary {
    pub lower: f64,
    pub upper: f64,
    pub observed: usize,
    pub expected_null: f64,
}

/// Result of [`estimate_swfdr`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SwfdrEstimate {
    /// Science-wise FDR: the fitted null proportion.
    pub pi0: f64,
    pub alpha: f64,
    pub beta: f64,
    /// Posterior null probability per observation; `None` for rounded ones.
    pub z: Vec<Option<f64>>,
    pub bins: Vec<BinSummary>,
    /// EM iterations actually run.
    pub iterations: usize,
}

/// Fit the censored mixture.
///
/// `pvalues`, `truncated` and `rounded` are parallel slices. Every p-value
/// must lie in (0, 0.05].
pub fn estimate_swfdr(
    pvalues: &[f64],
    truncated: &[bool],
    rounded: &[bool],
    config: &EmConfig,
) -> Result<SwfdrEstimate, EstimationError> {
    config.validate()?;
    let corpus = CensoredCorpus::new(pvalues, truncated, rounded)?;
    let (exact, n_truncated, n_rounded) = corpus.class_counts();
    info!(
        "Fitting censored mixture to {} p-values ({} exact, {} truncated, {} rounded)",
        corpus.len(),
        exact,
        n_truncated,
        n_rounded
    );

    let mut state = config.start();
    let mut iterations = 0;
    while iterations < config.iterations {
        let (next, _) = state.step(&corpus, &config.optimizer, iterations + 1)?;
        iterations += 1;
        let change = next.max_change(&state);
        debug!(
            "EM iteration {}: pi0={:.5} alpha={:.4} beta={:.3} (change {:.2e})",
            iterations, next.pi0, next.alpha, next.beta, change
        );
        state = next;
        if config.tol.is_some_and(|tol| change < tol) {
            info!("EM converged after {} iterations", iterations);
            break;
        }
    }

    let posterior = state
        .e_step(&corpus)
        .map_err(|reason| EstimationError::EmFailure {
            iteration: iterations,
            reason,
        })?;
    let bins = (0..N_BINS)
        .map(|b| {
            let observed = corpus.bin_counts()[b];
            BinSummary {
                lower: BIN_EDGES[b],
                upper: BIN_EDGES[b + 1],
                observed,
                expected_null: observed as f64 * posterior.bin_z[b],
            }
        })
        .collect();

    info!(
        "Estimated science-wise FDR {:.4} (alpha={:.4}, beta={:.3})",
        state.pi0, state.alpha, state.beta
    );
    Ok(SwfdrEstimate {
        pi0: state.pi0,
        alpha: state.alpha,
        beta: state.beta,
        z: posterior.z,
        bins,
        iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_corpus() -> (Vec<f64>, Vec<bool>, Vec<bool>) {
        let p = vec![0.001, 0.004, 0.02, 0.03, 0.045, 0.01, 0.002, 0.05, 0.033, 0.012];
        let truncated = vec![false, false, false, true, false, false, true, false, false, false];
        let rounded = vec![false, true, true, false, false, false, false, true, false, false];
        (p, truncated, rounded)
    }

    #[test]
    fn test_default_config() {
        let config = EmConfig::default();
        assert_eq!((config.pi0, config.alpha, config.beta), (0.5, 1.0, 50.0));
        assert_eq!(config.iterations, 100);
        assert_eq!(config.tol, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_iterations_returns_start() {
        let (p, t, r) = small_corpus();
        let config = EmConfig {
            iterations: 0,
            ..EmConfig::default()
        };
        let est = estimate_swfdr(&p, &t, &r, &config).unwrap();
        assert_eq!(est.iterations, 0);
        assert_eq!((est.pi0, est.alpha, est.beta), (0.5, 1.0, 50.0));
        assert_eq!(est.z.len(), p.len());
        assert_eq!(est.z[1], None);
        assert_eq!(est.z[7], None);
        assert!(est.z[0].is_some());
    }

    #[test]
    fn test_bins_report_rounded_counts() {
        let (p, t, r) = small_corpus();
        let config = EmConfig {
            iterations: 3,
            ..EmConfig::default()
        };
        let est = estimate_swfdr(&p, &t, &r, &config).unwrap();
        assert_eq!(est.iterations, 3);
        assert_eq!(est.bins.len(), N_BINS);
        let observed: Vec<usize> = est.bins.iter().map(|b| b.observed).collect();
        assert_eq!(observed, vec![1, 0, 1, 0, 0, 1]);
        for bin in &est.bins {
            assert!(bin.expected_null >= 0.0 && bin.expected_null <= bin.observed as f64);
        }
        assert_eq!(est.bins[5].upper, 0.05);
    }

    #[test]
    fn test_tolerance_stops_early() {
        let (p, t, r) = small_corpus();
        // Shapes are bounded by e^10, so any single step moves less than this
        let config = EmConfig {
            iterations: 50,
            tol: Some(1e6),
            ..EmConfig::default()
        };
        let est = estimate_swfdr(&p, &t, &r, &config).unwrap();
        assert_eq!(est.iterations, 1);
    }

    #[test]
    fn test_rejects_bad_configuration() {
        let (p, t, r) = small_corpus();
        for config in [
            EmConfig { pi0: 0.0, ..EmConfig::default() },
            EmConfig { pi0: 1.0, ..EmConfig::default() },
            EmConfig { alpha: -1.0, ..EmConfig::default() },
            EmConfig { beta: f64::INFINITY, ..EmConfig::default() },
            EmConfig { tol: Some(0.0), ..EmConfig::default() },
        ] {
            assert!(matches!(
                estimate_swfdr(&p, &t, &r, &config),
                Err(EstimationError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn test_rejects_pvalue_outside_window() {
        let err = estimate_swfdr(&[0.01, 0.06], &[false; 2], &[false; 2], &EmConfig::default()).unwrap_err();
        assert_eq!(err, EstimationError::InvalidPValue { index: 1, value: 0.06 });
    }
}
