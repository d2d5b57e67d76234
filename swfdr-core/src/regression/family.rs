//! GLM families for the exceedance regressions.
//!
//! A family pairs the link with the variance function and supplies the
//! working quantities IRLS needs: starting values, weights, deviance.

use super::link::{get_link, LinkFunction, RegressionType};

/// Fitted probabilities are kept this far from 0 and 1.
const MU_EPS: f64 = 1e-10;

/// A GLM family: distribution + link function.
pub struct Family {
    pub regression: RegressionType,
    link: Box<dyn LinkFunction + Send + Sync>,
}

impl Family {
    pub fn new(regression: RegressionType) -> Self {
        Self {
            regression,
            link: get_link(regression),
        }
    }

    /// Starting values for mu.
    pub fn initialize_mu(&self, y: &[f64]) -> Vec<f64> {
        match self.regression {
            // mu_init = (y + 0.5) / 2 keeps every start strictly inside (0, 1)
            RegressionType::Logistic => y.iter().map(|&yi| (yi + 0.5) / 2.0).collect(),
            RegressionType::Linear => y.to_vec(),
        }
    }

    /// eta = g(mu).
    pub fn link(&self, mu: &[f64]) -> Vec<f64> {
        mu.iter().map(|&m| self.link.link(m)).collect()
    }

    /// mu = g^{-1}(eta), clamped for the binomial family.
    pub fn update_mu(&self, eta: &[f64]) -> Vec<f64> {
        let mu = eta.iter().map(|&e| self.link.inv_link(e));
        match self.regression {
            RegressionType::Logistic => mu.map(|m| m.clamp(MU_EPS, 1.0 - MU_EPS)).collect(),
            RegressionType::Linear => mu.collect(),
        }
    }

    /// IRLS weights (d mu / d eta)^2 / V(mu), with eta recovered from mu.
    pub fn working_weights(&self, mu: &[f64]) -> Vec<f64> {
        mu.iter()
            .map(|&m| {
                let d = self.link.inv_link_deriv(self.link.link(m));
                let v = self.link.variance(m);
                (d * d / v.max(1e-300)).max(1e-300)
            })
            .collect()
    }

    /// d eta / d mu, used to form the working response.
    pub fn eta_deriv(&self, mu: &[f64]) -> Vec<f64> {
        mu.iter()
            .map(|&m| 1.0 / self.link.inv_link_deriv(self.link.link(m)).max(1e-300))
            .collect()
    }

    /// Residual deviance of `mu` against `y`.
    pub fn deviance(&self, y: &[f64], mu: &[f64]) -> f64 {
        match self.regression {
            RegressionType::Logistic => {
                2.0 * y
                    .iter()
                    .zip(mu.iter())
                    .map(|(&yi, &mi)| y_log_y(yi, mi) + y_log_y(1.0 - yi, 1.0 - mi))
                    .sum::<f64>()
            }
            RegressionType::Linear => y
                .iter()
                .zip(mu.iter())
                .map(|(&yi, &mi)| (yi - mi) * (yi - mi))
                .sum(),
        }
    }
}

/// y * ln(y / mu) with the 0 * ln 0 = 0 convention.
fn y_log_y(y: f64, mu: f64) -> f64 {
    if y > 0.0 {
        y * (y / mu).ln()
    } else {
        0.0
    }
}
