use crate::common::*;

use candle_util::sgvb::{
    randn_with, ElboSample, FixedGaussianPrior, GaussianLikelihood, Likelihood, Prior,
    UniformPrior,
};
use rand::Rng;

/// Latent quantities of the linear-Gaussian model, declared once.
///
/// The position in `Latent::ALL` is also the column of the latent in
/// the guide's unconstrained parameter vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Latent {
    Weight,
    Bias,
    Sigma,
}

impl Latent {
    pub const ALL: [Latent; 3] = [Latent::Weight, Latent::Bias, Latent::Sigma];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        match self {
            Latent::Weight => 0,
            Latent::Bias => 1,
            Latent::Sigma => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Latent::Weight => "weight",
            Latent::Bias => "bias",
            Latent::Sigma => "sigma",
        }
    }
}

impl std::fmt::Display for Latent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// `S` joint draws of the latents in the constrained space
pub struct LatentDraw {
    /// (S,)
    pub weight: Tensor,
    /// (S,)
    pub bias: Tensor,
    /// (S,), inside the support of the sigma prior
    pub sigma: Tensor,
    /// guide log density of each joint draw, (S,)
    pub log_q: Tensor,
}

impl LatentDraw {
    pub fn num_draws(&self) -> Result<usize> {
        Ok(self.weight.dim(0)?)
    }

    pub fn get(&self, latent: Latent) -> &Tensor {
        match latent {
            Latent::Weight => &self.weight,
            Latent::Bias => &self.bias,
            Latent::Sigma => &self.sigma,
        }
    }

    /// Same values, cut from the autograd graph
    pub fn detach(&self) -> Self {
        Self {
            weight: self.weight.detach(),
            bias: self.bias.detach(),
            sigma: self.sigma.detach(),
            log_q: self.log_q.detach(),
        }
    }

    /// S x 3 matrix with columns ordered as `Latent::ALL`
    pub fn to_mat(&self) -> Result<Mat> {
        let s = self.num_draws()?;
        let columns = Latent::ALL
            .iter()
            .map(|&l| self.get(l).to_dtype(DType::F32)?.to_vec1::<f32>())
            .collect::<candle_util::candle_core::Result<Vec<_>>>()?;

        Ok(Mat::from_shape_fn((s, Latent::COUNT), |(i, j)| columns[j][i]))
    }
}

/// One batched pass of the model at a `LatentDraw`
pub struct Trace {
    /// mean function w * x + b, (S, n)
    pub mean: Tensor,
    /// log p(w) + log p(b) + log p(σ) [+ log p(y | x, w, b, σ)], (S,)
    pub log_joint: Tensor,
    /// y ~ N(mean, σ²), (S, n), only in prediction mode
    pub obs: Option<Tensor>,
}

/// Bayesian linear regression
///
/// ```text
/// w ~ N(0, 1),  b ~ N(0, 1),  σ ~ U(0, 5)
/// y(i) ~ N(w * x(i) + b, σ²)
/// ```
#[derive(Debug, Clone)]
pub struct GenerativeModel {
    weight_prior: FixedGaussianPrior,
    bias_prior: FixedGaussianPrior,
    sigma_prior: UniformPrior,
}

impl Default for GenerativeModel {
    fn default() -> Self {
        Self::new(
            FixedGaussianPrior::standard(),
            FixedGaussianPrior::standard(),
            UniformPrior::new(0.0, 5.0),
        )
    }
}

impl GenerativeModel {
    pub fn new(
        weight_prior: FixedGaussianPrior,
        bias_prior: FixedGaussianPrior,
        sigma_prior: UniformPrior,
    ) -> Self {
        Self {
            weight_prior,
            bias_prior,
            sigma_prior,
        }
    }

    /// Support `(low, high)` of the noise scale
    pub fn sigma_support(&self) -> (f64, f64) {
        (self.sigma_prior.low(), self.sigma_prior.high())
    }

    /// mean(s, i) = w(s) * x(i) + b(s)
    ///
    /// * `x` - inputs, (n,)
    pub fn mean(&self, x: &Tensor, draw: &LatentDraw) -> Result<Tensor> {
        let w_s1 = draw.weight.unsqueeze(1)?;
        let b_s1 = draw.bias.unsqueeze(1)?;
        let x_1n = x.unsqueeze(0)?;
        Ok(x_1n.broadcast_mul(&w_s1)?.broadcast_add(&b_s1)?)
    }

    /// Sum of the three log priors, (S,)
    pub fn log_prior(&self, draw: &LatentDraw) -> Result<Tensor> {
        let lp_w = self.weight_prior.log_prob(&draw.weight)?;
        let lp_b = self.bias_prior.log_prob(&draw.bias)?;
        let lp_sigma = self.sigma_prior.log_prob(&draw.sigma)?;
        Ok(((lp_w + lp_b)? + lp_sigma)?)
    }

    /// Predicted means and the log joint density at `draw`.
    ///
    /// With `y` the log likelihood of every observation is added to the
    /// log prior; without it only the prior is scored.
    ///
    /// * `x` - inputs, (n,)
    /// * `y` - observations, (n,)
    pub fn evaluate(&self, x: &Tensor, y: Option<&Tensor>, draw: &LatentDraw) -> Result<Trace> {
        if x.dim(0)? == 0 {
            return Err(LentilError::invalid_input("no input points"));
        }
        let mean = self.mean(x, draw)?;
        let log_prior = self.log_prior(draw)?;

        let log_joint = match y {
            Some(y) => {
                if y.dims() != x.dims() {
                    return Err(LentilError::invalid_input(format!(
                        "x and y differ in shape: {:?} vs {:?}",
                        x.dims(),
                        y.dims()
                    )));
                }
                let llik = GaussianLikelihood::new(y.clone()).log_likelihood(&mean, &draw.sigma)?;
                (log_prior + llik)?
            }
            None => log_prior,
        };

        Ok(Trace {
            mean,
            log_joint,
            obs: None,
        })
    }

    /// ELBO terms log p(y, θ) and log q(θ) for gradient estimation
    pub fn elbo_sample(&self, x: &Tensor, y: &Tensor, draw: &LatentDraw) -> Result<ElboSample> {
        let trace = self.evaluate(x, Some(y), draw)?;
        Ok(ElboSample {
            log_joint: trace.log_joint,
            log_q: draw.log_q.clone(),
        })
    }

    /// obs(s, i) = mean(s, i) + σ(s) * ε(s, i), ε ~ N(0, 1)
    pub fn sample_observations<R: Rng + ?Sized>(
        &self,
        mean: &Tensor,
        sigma: &Tensor,
        rng: &mut R,
    ) -> Result<Tensor> {
        let (s, n) = mean.dims2()?;
        let eps = randn_with(rng, (s, n), mean.device())?.to_dtype(mean.dtype())?;
        Ok(mean.broadcast_add(&eps.broadcast_mul(&sigma.unsqueeze(1)?)?)?)
    }

    /// Pure prediction mode: score the priors and sample observations
    pub fn predict<R: Rng + ?Sized>(
        &self,
        x: &Tensor,
        draw: &LatentDraw,
        rng: &mut R,
    ) -> Result<Trace> {
        let trace = self.evaluate(x, None, draw)?;
        let obs = self.sample_observations(&trace.mean, &draw.sigma, rng)?;
        Ok(Trace {
            obs: Some(obs),
            ..trace
        })
    }
}
