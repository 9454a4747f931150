//! Stochastic Gradient Variational Bayes (SGVB) module.
//!
//! Building blocks for reparameterized variational inference on candle
//! tensors: mean-field Gaussian families, fixed priors, constraint
//! transforms, observation likelihoods and ELBO losses.
//!
//! # Key characteristics
//!
//! - Pathwise gradients: `θ = μ + σ ⊙ ε`, `ε ~ N(0, I)`
//! - Noise ε comes from a caller-owned `rand::Rng`
//! - Constrained latents live in unconstrained space, with the
//!   log-Jacobian of the transform entering log q
//!
//! # Example
//!
//! ```ignore
//! use candle_util::sgvb::*;
//!
//! let q = GaussianVariational::new(vb.pp("guide"), 3, 0.1)?;
//! let mut optimizer = AdamW::new(varmap.all_vars(), params)?;
//!
//! for _ in 0..num_iters {
//!     let theta = q.sample_with(&mut rng, num_particles)?;
//!     let sample = ElboSample {
//!         log_joint: my_log_joint(&theta)?,
//!         log_q: q.log_prob(&theta)?,
//!     };
//!     optimizer.backward_step(&direct_elbo_loss(&sample)?)?;
//! }
//! ```

mod gaussian;
mod gaussian_prior;
pub mod likelihood;
mod sgvb;
mod traits;
mod transform;

pub use gaussian::{randn_with, GaussianVariational};
pub use gaussian_prior::{FixedGaussianPrior, UniformPrior};
pub use likelihood::GaussianLikelihood;
pub use sgvb::{compute_elbo, direct_elbo_loss, elbo_terms};
pub use traits::{ElboSample, Likelihood, Prior, VariationalDistribution};
pub use transform::{ConstraintTransform, IntervalTransform};
