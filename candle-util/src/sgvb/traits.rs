use candle_core::{Result, Tensor};

/// Observation likelihood with a location and a scale.
/// Unlike a black-box likelihood, gradients flow through both arguments.
pub trait Likelihood {
    /// Evaluate log p(y | loc, scale)
    ///
    /// # Arguments
    /// * `loc` - predicted means, shape (S, n) for S draws
    /// * `scale` - observation noise scale, shape (S,)
    ///
    /// # Returns
    /// Log-likelihood summed over observations, shape (S,)
    fn log_likelihood(&self, loc: &Tensor, scale: &Tensor) -> Result<Tensor>;
}

/// Variational distribution over an unconstrained parameter vector.
pub trait VariationalDistribution {
    /// Variational mean μ, shape (d,)
    fn mean(&self) -> Result<Tensor>;

    /// Variational variance σ², shape (d,)
    fn var(&self) -> Result<Tensor>;

    /// Reparameterized draw θ = μ + σ * ε
    ///
    /// # Arguments
    /// * `epsilon` - standard normal noise, shape (S, d)
    ///
    /// # Returns
    /// Samples, shape (S, d)
    fn rsample(&self, epsilon: &Tensor) -> Result<Tensor>;

    /// Compute log q(θ), summed over the d dimensions.
    ///
    /// # Arguments
    /// * `theta` - samples, shape (S, d)
    ///
    /// # Returns
    /// Log density, shape (S,)
    fn log_prob(&self, theta: &Tensor) -> Result<Tensor>;
}

/// Prior distribution over a scalar latent.
pub trait Prior {
    /// Element-wise log p(θ).
    ///
    /// # Arguments
    /// * `theta` - draws of the latent, any shape
    ///
    /// # Returns
    /// Log prior density with the same shape as `theta`
    fn log_prob(&self, theta: &Tensor) -> Result<Tensor>;
}

/// One batch of Monte Carlo terms of the ELBO.
pub struct ElboSample {
    /// log p(y, θ) for each draw, shape (S,)
    pub log_joint: Tensor,
    /// log q(θ) for each draw, shape (S,)
    pub log_q: Tensor,
}
