use candle_core::{Result, Tensor};

use super::traits::Prior;

/// Fixed (non-learnable) Gaussian prior p(θ) = N(μ, τ²)
#[derive(Debug, Clone, Copy)]
pub struct FixedGaussianPrior {
    loc: f64,
    tau: f64,
}

impl FixedGaussianPrior {
    /// Create a new fixed Gaussian prior.
    ///
    /// # Arguments
    /// * `loc` - Prior mean μ
    /// * `tau` - Prior scale τ
    pub fn new(loc: f64, tau: f64) -> Self {
        Self { loc, tau }
    }

    /// The standard normal N(0, 1)
    pub fn standard() -> Self {
        Self::new(0.0, 1.0)
    }

    pub fn loc(&self) -> f64 {
        self.loc
    }

    pub fn tau(&self) -> f64 {
        self.tau
    }
}

impl Prior for FixedGaussianPrior {
    /// log N(θ; μ, τ²) = -0.5 * [(θ-μ)²/τ² + 2*ln(τ) + ln(2π)]
    fn log_prob(&self, theta: &Tensor) -> Result<Tensor> {
        let ln_2pi = (2.0 * std::f64::consts::PI).ln();
        let const_term = 2.0 * self.tau.ln() + ln_2pi;

        let normalized = theta.affine(1.0 / self.tau, -self.loc / self.tau)?;
        (normalized.sqr()? + const_term)? * (-0.5)
    }
}

/// Fixed uniform prior p(θ) = U(low, high)
///
/// The density is `-ln(high - low)` inside the closed support and
/// `-inf` outside. It carries no gradient: inside the support it is
/// constant in θ.
#[derive(Debug, Clone, Copy)]
pub struct UniformPrior {
    low: f64,
    high: f64,
}

impl UniformPrior {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }
}

impl Prior for UniformPrior {
    fn log_prob(&self, theta: &Tensor) -> Result<Tensor> {
        let theta = theta.detach();
        let inside = (theta.ge(self.low)? * theta.le(self.high)?)?;

        let log_density = -(self.high - self.low).ln();
        let on_support = Tensor::full(log_density, theta.dims(), theta.device())?
            .to_dtype(theta.dtype())?;
        let off_support = Tensor::full(f64::NEG_INFINITY, theta.dims(), theta.device())?
            .to_dtype(theta.dtype())?;

        inside.where_cond(&on_support, &off_support)
    }
}
