use candle_core::{DType, Device, Result, Tensor};
use candle_nn::VarBuilder;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use super::traits::VariationalDistribution;

/// Gaussian variational distribution q(θ) = N(μ, diag(σ²))
///
/// Uses mean-field approximation with diagonal covariance.
/// Parameters are stored as mean μ and log standard deviation ln(σ).
pub struct GaussianVariational {
    /// Variational mean μ: shape (d,)
    mean: Tensor,
    /// Log standard deviation ln(σ): shape (d,)
    ln_std: Tensor,
}

impl GaussianVariational {
    /// Create a new Gaussian variational distribution.
    ///
    /// # Arguments
    /// * `vb` - VarBuilder for creating trainable parameters
    /// * `dim` - Number of latent dimensions
    /// * `init_std` - Initial standard deviation (stored as its log)
    ///
    /// # Returns
    /// GaussianVariational with μ = 0 and σ = `init_std`. The
    /// initialization does not touch any random number generator.
    pub fn new(vb: VarBuilder, dim: usize, init_std: f64) -> Result<Self> {
        let mean = vb.get_with_hints(dim, "mean", candle_nn::Init::Const(0.0))?;
        let ln_std = vb.get_with_hints(dim, "ln_std", candle_nn::Init::Const(init_std.ln()))?;
        Ok(Self { mean, ln_std })
    }

    /// Get the variational mean μ.
    pub fn loc(&self) -> &Tensor {
        &self.mean
    }

    /// Get the log standard deviation ln(σ).
    pub fn ln_std(&self) -> &Tensor {
        &self.ln_std
    }

    /// Get the variational standard deviation σ = exp(ln_std).
    pub fn std(&self) -> Result<Tensor> {
        self.ln_std.exp()
    }

    pub fn dim(&self) -> Result<usize> {
        self.mean.dim(0)
    }

    pub fn device(&self) -> &Device {
        self.mean.device()
    }

    pub fn dtype(&self) -> DType {
        self.mean.dtype()
    }

    /// Draw ε ~ N(0, I) of shape (S, d) from `rng` and return the
    /// reparameterized samples θ = μ + σ * ε.
    pub fn sample_with<R: Rng + ?Sized>(&self, rng: &mut R, num_samples: usize) -> Result<Tensor> {
        let epsilon = randn_with(rng, (num_samples, self.dim()?), self.device())?
            .to_dtype(self.dtype())?;
        self.rsample(&epsilon)
    }
}

impl VariationalDistribution for GaussianVariational {
    fn mean(&self) -> Result<Tensor> {
        Ok(self.mean.clone())
    }

    fn var(&self) -> Result<Tensor> {
        // σ² = exp(2 * ln_std)
        (&self.ln_std * 2.0)?.exp()
    }

    /// θ = μ + σ * ε: broadcast (d,) + (d,) * (S, d) -> (S, d)
    fn rsample(&self, epsilon: &Tensor) -> Result<Tensor> {
        let std = self.ln_std.exp()?.unsqueeze(0)?;
        self.mean.unsqueeze(0)?.broadcast_add(&epsilon.broadcast_mul(&std)?)
    }

    /// log q = -0.5 * [(θ-μ)²/σ² + 2*ln(σ) + ln(2π)], summed over d
    fn log_prob(&self, theta: &Tensor) -> Result<Tensor> {
        let ln_2pi = (2.0 * std::f64::consts::PI).ln();

        let std = self.ln_std.exp()?.unsqueeze(0)?;
        let diff = theta.broadcast_sub(&self.mean.unsqueeze(0)?)?;
        let normalized_sq = diff.broadcast_div(&std)?.sqr()?;

        let two_ln_std = (&self.ln_std * 2.0)?.unsqueeze(0)?;
        let log_prob_element = ((normalized_sq.broadcast_add(&two_ln_std)? + ln_2pi)? * (-0.5))?;

        log_prob_element.sum(1)
    }
}

/// Standard normal noise drawn from an explicit generator.
///
/// Candle's own `Tensor::randn` pulls from a device-wide generator;
/// this one is reproducible from the caller's seed.
pub fn randn_with<R: Rng + ?Sized>(
    rng: &mut R,
    shape: (usize, usize),
    device: &Device,
) -> Result<Tensor> {
    let (rows, cols) = shape;
    let data: Vec<f32> = (0..rows * cols)
        .map(|_| StandardNormal.sample(&mut *rng))
        .collect();
    Tensor::from_vec(data, (rows, cols), device)
}
