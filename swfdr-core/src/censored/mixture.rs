//! Two-component mixture on the reporting window and its EM step.
//!
//! Null: Uniform(0, c). Alternative: Beta(α, β) truncated to (0, c].
//! Each observation class contributes its own likelihood:
//!   exact p           f(p)
//!   truncated at t    F(t) / F(c)          (uniform: t / c)
//!   rounded to bin b  (F(hi) - F(lo)) / F(c)
//! with f the truncated density and F the Beta CDF.

use ndarray::{array, Array1};
use rayon::prelude::*;
use statrs::distribution::{Beta, ContinuousCDF};
use statrs::function::beta::ln_beta;
use tracing::{debug, warn};
use wolfe_bfgs::{Bfgs, BfgsSolution};

use super::corpus::{CensoredCorpus, Observation, BIN_EDGES, N_BINS, WINDOW};
use crate::error::EstimationError;
use crate::util::math::{central_gradient, safe_log};

/// Bound on ln α and ln β during the M-step.
const LOG_SHAPE_LIMIT: f64 = 10.0;
const GRADIENT_STEP: f64 = 1e-5;
/// Objective value reported for parameters where the likelihood breaks down.
const PENALTY: f64 = 1e10;

/// Beta(α, β) restricted to (0, c].
#[derive(Debug, Clone)]
pub struct TruncatedBeta {
    alpha: f64,
    beta: f64,
    dist: Beta,
    ln_beta: f64,
    ln_window_mass: f64,
}

impl TruncatedBeta {
    pub fn new(alpha: f64, beta: f64) -> Result<Self, String> {
        let dist = Beta::new(alpha, beta).map_err(|e| format!("Beta({}, {}): {}", alpha, beta, e))?;
        let ln_window_mass = safe_log(dist.cdf(WINDOW));
        Ok(Self {
            alpha,
            beta,
            dist,
            ln_beta: ln_beta(alpha, beta),
            ln_window_mass,
        })
    }

    /// Log density of the truncated distribution at p in (0, c].
    pub fn ln_pdf(&self, p: f64) -> f64 {
        (self.alpha - 1.0) * p.ln() + (self.beta - 1.0) * (-p).ln_1p() - self.ln_beta - self.ln_window_mass
    }

    /// Log of P(X <= x | X <= c).
    pub fn ln_cdf(&self, x: f64) -> f64 {
        safe_log(self.dist.cdf(x.min(WINDOW))) - self.ln_window_mass
    }

    /// Log of P(lo < X <= hi | X <= c).
    pub fn ln_mass(&self, lo: f64, hi: f64) -> f64 {
        safe_log((self.dist.cdf(hi) - self.dist.cdf(lo)).max(0.0)) - self.ln_window_mass
    }
}

/// P(null | data) from log likelihoods under each component.
fn posterior_null(pi0: f64, ln_null: f64, ln_alt: f64) -> f64 {
    let a = safe_log(pi0) + ln_null;
    let b = safe_log(1.0 - pi0) + ln_alt;
    if a == f64::NEG_INFINITY && b == f64::NEG_INFINITY {
        return pi0;
    }
    let top = a.max(b);
    let (ea, eb) = ((a - top).exp(), (b - top).exp());
    ea / (ea + eb)
}

/// Posterior null probabilities from one E-step.
#[derive(Debug, Clone, PartialEq)]
pub struct Posterior {
    /// Per observation; `None` for rounded observations.
    pub z: Vec<Option<f64>>,
    /// Per rounding bin.
    pub bin_z: [f64; N_BINS],
}

impl Posterior {
    /// Expected number of null observations in the corpus.
    pub fn expected_null(&self, corpus: &CensoredCorpus) -> f64 {
        let point: f64 = self.z.iter().flatten().sum();
        let binned: f64 = corpus
            .bin_counts()
            .iter()
            .zip(self.bin_z.iter())
            .map(|(&n, &z)| n as f64 * z)
            .sum();
        point + binned
    }
}

/// BFGS settings for the (α, β) update.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BfgsConfig {
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for BfgsConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 100,
        }
    }
}

/// Alternative-component weights reduced to what the Beta likelihood needs.
#[derive(Debug, Clone)]
struct AlternativeWeights {
    exact: f64,
    sum_ln_p: f64,
    sum_ln_1mp: f64,
    /// (bound, weight) per distinct truncation bound.
    truncated: Vec<(f64, f64)>,
    bins: [f64; N_BINS],
    n: f64,
}

impl AlternativeWeights {
    fn new(corpus: &CensoredCorpus, posterior: &Posterior) -> Self {
        let mut weights = Self {
            exact: 0.0,
            sum_ln_p: 0.0,
            sum_ln_1mp: 0.0,
            truncated: corpus.bounds().iter().map(|&b| (b, 0.0)).collect(),
            bins: [0.0; N_BINS],
            n: corpus.len() as f64,
        };
        for (obs, z) in corpus.observations().iter().zip(posterior.z.iter()) {
            let w = 1.0 - z.unwrap_or(0.0);
            match *obs {
                Observation::Exact { p } => {
                    weights.exact += w;
                    weights.sum_ln_p += w * p.ln();
                    weights.sum_ln_1mp += w * (-p).ln_1p();
                }
                Observation::Truncated { bound } => weights.truncated[bound].1 += w,
                Observation::Rounded { .. } => {}
            }
        }
        for (b, &count) in corpus.bin_counts().iter().enumerate() {
            weights.bins[b] = count as f64 * (1.0 - posterior.bin_z[b]);
        }
        weights
    }

    fn log_likelihood(&self, alpha: f64, beta: f64) -> f64 {
        let alt = match TruncatedBeta::new(alpha, beta) {
            Ok(alt) => alt,
            Err(_) => return f64::NEG_INFINITY,
        };
        let mut ll = (alpha - 1.0) * self.sum_ln_p + (beta - 1.0) * self.sum_ln_1mp
            - self.exact * (alt.ln_beta + alt.ln_window_mass);
        for &(bound, w) in &self.truncated {
            if w > 0.0 {
                ll += w * alt.ln_cdf(bound);
            }
        }
        for (b, &w) in self.bins.iter().enumerate() {
            if w > 0.0 {
                ll += w * alt.ln_mass(BIN_EDGES[b], BIN_EDGES[b + 1]);
            }
        }
        ll
    }

    /// Negative mean log-likelihood over (ln α, ln β).
    fn objective(&self, log_shape: &[f64]) -> f64 {
        let a = log_shape[0].clamp(-LOG_SHAPE_LIMIT, LOG_SHAPE_LIMIT).exp();
        let b = log_shape[1].clamp(-LOG_SHAPE_LIMIT, LOG_SHAPE_LIMIT).exp();
        let value = -self.log_likelihood(a, b) / self.n;
        if value.is_finite() {
            value
        } else {
            PENALTY
        }
    }
}

/// EM state: mixing proportion and alternative shape parameters.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MixtureState {
    pub pi0: f64,
    pub alpha: f64,
    pub beta: f64,
}

impl Default for MixtureState {
    fn default() -> Self {
        Self {
            pi0: 0.5,
            alpha: 1.0,
            beta: 50.0,
        }
    }
}

impl MixtureState {
    pub fn is_finite(&self) -> bool {
        self.pi0.is_finite() && self.alpha.is_finite() && self.beta.is_finite()
    }

    /// Largest absolute parameter change.
    pub fn max_change(&self, other: &MixtureState) -> f64 {
        (self.pi0 - other.pi0)
            .abs()
            .max((self.alpha - other.alpha).abs())
            .max((self.beta - other.beta).abs())
    }

    /// Posterior null probabilities under this state.
    pub fn e_step(&self, corpus: &CensoredCorpus) -> Result<Posterior, String> {
        let alt = TruncatedBeta::new(self.alpha, self.beta)?;
        let ln_null_density = -WINDOW.ln();

        let bound_z: Vec<f64> = corpus
            .bounds()
            .iter()
            .map(|&t| posterior_null(self.pi0, (t / WINDOW).ln(), alt.ln_cdf(t)))
            .collect();
        let mut bin_z = [0.0; N_BINS];
        for (b, z) in bin_z.iter_mut().enumerate() {
            let (lo, hi) = (BIN_EDGES[b], BIN_EDGES[b + 1]);
            *z = posterior_null(self.pi0, ((hi - lo) / WINDOW).ln(), alt.ln_mass(lo, hi));
        }

        let z = corpus
            .observations()
            .par_iter()
            .map(|obs| match *obs {
                Observation::Exact { p } => Some(posterior_null(self.pi0, ln_null_density, alt.ln_pdf(p))),
                Observation::Truncated { bound } => Some(bound_z[bound]),
                Observation::Rounded { .. } => None,
            })
            .collect();
        Ok(Posterior { z, bin_z })
    }

    /// New state from a posterior. Keeps the current (α, β) when the
    /// optimizer fails.
    pub fn m_step(&self, corpus: &CensoredCorpus, posterior: &Posterior, optimizer: &BfgsConfig) -> MixtureState {
        let pi0 = posterior.expected_null(corpus) / corpus.len() as f64;
        let weights = AlternativeWeights::new(corpus, posterior);

        let cost_and_grad = move |x: &Array1<f64>| -> (f64, Array1<f64>) {
            let point = x.to_vec();
            let value = weights.objective(&point);
            let grad = central_gradient(|v| weights.objective(v), &point, GRADIENT_STEP);
            (value, Array1::from(grad))
        };

        let start = array![self.alpha.ln(), self.beta.ln()];
        let (alpha, beta) = match Bfgs::new(start, cost_and_grad)
            .with_tolerance(optimizer.tolerance)
            .with_max_iterations(optimizer.max_iterations)
            .run()
        {
            Ok(BfgsSolution {
                final_point,
                iterations,
                ..
            }) => {
                debug!("Shape update converged in {} BFGS iterations", iterations);
                (
                    final_point[0].clamp(-LOG_SHAPE_LIMIT, LOG_SHAPE_LIMIT).exp(),
                    final_point[1].clamp(-LOG_SHAPE_LIMIT, LOG_SHAPE_LIMIT).exp(),
                )
            }
            Err(e) => {
                warn!("Shape update failed ({:?}); keeping alpha={:.4}, beta={:.4}", e, self.alpha, self.beta);
                (self.alpha, self.beta)
            }
        };

        MixtureState { pi0, alpha, beta }
    }

    /// One EM iteration. Returns the updated state and the posterior the
    /// update was computed from.
    pub fn step(
        &self,
        corpus: &CensoredCorpus,
        optimizer: &BfgsConfig,
        iteration: usize,
    ) -> Result<(MixtureState, Posterior), EstimationError> {
        let posterior = self
            .e_step(corpus)
            .map_err(|reason| EstimationError::EmFailure { iteration, reason })?;
        let next = self.m_step(corpus, &posterior, optimizer);
        if !next.is_finite() {
            return Err(EstimationError::EmFailure {
                iteration,
                reason: format!("non-finite state {:?}", next),
            });
        }
        Ok((next, posterior))
    }
}
