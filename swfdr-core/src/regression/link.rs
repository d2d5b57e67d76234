//! Link functions for the per-λ regressions.
//!
//! Maps between the linear predictor (eta) and the fitted probability (mu).

use std::fmt;
use std::str::FromStr;

/// Which regression the λ sweep fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegressionType {
    /// Binomial GLM with logit link on the exceedance indicator.
    #[default]
    Logistic,
    /// Ordinary least squares on the same indicator.
    Linear,
}

impl fmt::Display for RegressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegressionType::Logistic => write!(f, "logistic"),
            RegressionType::Linear => write!(f, "linear"),
        }
    }
}

impl FromStr for RegressionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "logistic" | "logit" => Ok(RegressionType::Logistic),
            "linear" | "ols" => Ok(RegressionType::Linear),
            other => Err(format!("Unknown regression type: {}", other)),
        }
    }
}

/// Link function interface.
pub trait LinkFunction {
    /// eta = g(mu).
    fn link(&self, mu: f64) -> f64;
    /// mu = g^{-1}(eta).
    fn inv_link(&self, eta: f64) -> f64;
    /// d(mu)/d(eta).
    fn inv_link_deriv(&self, eta: f64) -> f64;
    /// Variance function V(mu).
    fn variance(&self, mu: f64) -> f64;
}

/// Logit link for the logistic sweep.
#[derive(Debug, Clone, Copy)]
pub struct LogitLink;

impl LinkFunction for LogitLink {
    fn link(&self, mu: f64) -> f64 {
        (mu / (1.0 - mu)).ln()
    }

    fn inv_link(&self, eta: f64) -> f64 {
        // Split on sign so exp never overflows
        if eta >= 0.0 {
            1.0 / (1.0 + (-eta).exp())
        } else {
            let e = eta.exp();
            e / (1.0 + e)
        }
    }

    fn inv_link_deriv(&self, eta: f64) -> f64 {
        let p = self.inv_link(eta);
        p * (1.0 - p)
    }

    fn variance(&self, mu: f64) -> f64 {
        mu * (1.0 - mu)
    }
}

/// Identity link for the linear sweep.
#[derive(Debug, Clone, Copy)]
pub struct IdentityLink;

impl LinkFunction for IdentityLink {
    fn link(&self, mu: f64) -> f64 {
        mu
    }

    fn inv_link(&self, eta: f64) -> f64 {
        eta
    }

    fn inv_link_deriv(&self, _eta: f64) -> f64 {
        1.0
    }

    fn variance(&self, _mu: f64) -> f64 {
        1.0
    }
}

/// Link function for a regression type.
pub fn get_link(regression: RegressionType) -> Box<dyn LinkFunction + Send + Sync> {
    match regression {
        RegressionType::Logistic => Box::new(LogitLink),
        RegressionType::Linear => Box::new(IdentityLink),
    }
}
