//! Gaussian likelihood for continuous data.

use candle_core::{Result, Tensor};

use crate::sgvb::Likelihood;

/// Gaussian likelihood: y ~ N(μ, σ²) with one noise scale per draw.
///
/// # Model
/// ```text
/// log p(y | μ, σ) = -0.5 * [log(2π) + 2 log σ + (y - μ)² / σ²]
/// ```
pub struct GaussianLikelihood {
    /// observations: (n,)
    y: Tensor,
}

impl GaussianLikelihood {
    pub fn new(y: Tensor) -> Self {
        Self { y }
    }

    pub fn num_obs(&self) -> Result<usize> {
        self.y.dim(0)
    }
}

impl Likelihood for GaussianLikelihood {
    fn log_likelihood(&self, loc: &Tensor, scale: &Tensor) -> Result<Tensor> {
        let ln_2pi: f64 = (2.0 * std::f64::consts::PI).ln();

        // (S, n) - (1, n) over (S, 1)
        let scale = scale.unsqueeze(1)?;
        let z = loc
            .broadcast_sub(&self.y.unsqueeze(0)?)?
            .broadcast_div(&scale)?;

        let log_prob = (z.sqr()?.broadcast_add(&(scale.log()? * 2.0)?)? + ln_2pi)? * (-0.5);

        // Sum over the n observations
        log_prob?.sum(1)
    }
}
