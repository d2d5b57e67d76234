//! Published p-values with their censoring flags.
//!
//! Every value lives in the reporting window (0, c], c = 0.05. Three
//! observation classes:
//! - exact: the reported value is the p-value
//! - truncated: the reported value t only bounds it, p <= min(t, c)
//! - rounded (and not truncated): the p-value is known up to its bin

use crate::error::EstimationError;

/// Upper end of the reporting window.
pub const WINDOW: f64 = 0.05;

/// Cut points of the rounding bins: (0, .005], (.005, .015], ..., (.045, .05].
pub const BIN_EDGES: [f64; 7] = [0.0, 0.005, 0.015, 0.025, 0.035, 0.045, 0.05];

pub const N_BINS: usize = BIN_EDGES.len() - 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    Exact { p: f64 },
    /// Index into [`CensoredCorpus::bounds`].
    Truncated { bound: usize },
    Rounded { bin: usize },
}

/// Immutable, validated corpus.
#[derive(Debug, Clone)]
pub struct CensoredCorpus {
    observations: Vec<Observation>,
    bounds: Vec<f64>,
    bin_counts: [usize; N_BINS],
}

/// Bin holding `p`, for p in (0, c].
pub fn bin_index(p: f64) -> usize {
    BIN_EDGES[1..]
        .iter()
        .position(|&upper| p <= upper)
        .unwrap_or(N_BINS - 1)
}

impl CensoredCorpus {
    pub fn new(pvalues: &[f64], truncated: &[bool], rounded: &[bool]) -> Result<Self, EstimationError> {
        if pvalues.len() != truncated.len() || pvalues.len() != rounded.len() {
            return Err(EstimationError::config(format!(
                "Corpus lengths differ: {} p-values, {} truncation flags, {} rounding flags",
                pvalues.len(),
                truncated.len(),
                rounded.len()
            )));
        }
        if pvalues.is_empty() {
            return Err(EstimationError::config("Corpus is empty"));
        }
        if let Some(index) = pvalues
            .iter()
            .position(|&p| !p.is_finite() || p <= 0.0 || p > WINDOW)
        {
            return Err(EstimationError::InvalidPValue {
                index,
                value: pvalues[index],
            });
        }

        let mut bounds: Vec<f64> = pvalues
            .iter()
            .zip(truncated)
            .filter(|(_, &t)| t)
            .map(|(&p, _)| p.min(WINDOW))
            .collect();
        bounds.sort_by(f64::total_cmp);
        bounds.dedup();

        let mut bin_counts = [0; N_BINS];
        let observations = pvalues
            .iter()
            .zip(truncated.iter().zip(rounded))
            .map(|(&p, (&t, &r))| {
                if t {
                    let bound = bounds.partition_point(|&b| b < p.min(WINDOW));
                    Observation::Truncated { bound }
                } else if r {
                    let bin = bin_index(p);
                    bin_counts[bin] += 1;
                    Observation::Rounded { bin }
                } else {
                    Observation::Exact { p }
                }
            })
            .collect();

        Ok(Self {
            observations,
            bounds,
            bin_counts,
        })
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Distinct truncation bounds, ascending.
    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    /// Rounded observations per bin.
    pub fn bin_counts(&self) -> &[usize; N_BINS] {
        &self.bin_counts
    }

    /// (exact, truncated, rounded) counts.
    pub fn class_counts(&self) -> (usize, usize, usize) {
        let rounded: usize = self.bin_counts.iter().sum();
        let truncated = self
            .observations
            .iter()
            .filter(|o| matches!(o, Observation::Truncated { .. }))
            .count();
        (self.len() - truncated - rounded, truncated, rounded)
    }
}
