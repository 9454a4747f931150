//! SGVB against a normal-normal model with a closed-form posterior.
//!
//! θ ~ N(0, 1), y(i) ~ N(θ, 1), i = 1..n
//! posterior: N(n * ȳ / (n + 1), 1 / (n + 1))

use candle_core::{DType, Device, Result, Tensor};
use candle_nn::{Optimizer, VarBuilder, VarMap};
use candle_util::candle_inference::adam;
use candle_util::sgvb::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn fit_normal_mean(y: &[f32], num_steps: usize, seed: u64) -> Result<(f32, f32)> {
    let device = Device::Cpu;
    let n = y.len();

    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
    let q = GaussianVariational::new(vb.pp("theta"), 1, 0.5)?;
    let mut optimizer = adam(&varmap, 0.05)?;

    let prior = FixedGaussianPrior::standard();
    let likelihood = GaussianLikelihood::new(Tensor::new(y, &device)?);
    let mut rng = StdRng::seed_from_u64(seed);
    let num_particles = 8;

    for _ in 0..num_steps {
        let theta_s1 = q.sample_with(&mut rng, num_particles)?;
        let loc_sn = theta_s1.broadcast_as((num_particles, n))?.contiguous()?;
        let scale_s = Tensor::ones(num_particles, DType::F32, &device)?;

        let log_joint = (likelihood.log_likelihood(&loc_sn, &scale_s)?
            + prior.log_prob(&theta_s1)?.sum(1)?)?;
        let sample = ElboSample {
            log_joint,
            log_q: q.log_prob(&theta_s1)?,
        };
        optimizer.backward_step(&direct_elbo_loss(&sample)?)?;
    }

    let loc = q.loc().to_vec1::<f32>()?[0];
    let std = q.std()?.to_vec1::<f32>()?[0];
    Ok((loc, std))
}

#[test]
fn recovers_conjugate_posterior() -> Result<()> {
    let y = vec![1.5f32, 2.5, 2.0, 1.0, 3.0, 2.2, 1.8, 2.4, 1.6, 2.0];
    let n = y.len() as f32;
    let y_bar = y.iter().sum::<f32>() / n;

    let post_mean = n * y_bar / (n + 1.0);
    let post_std = (1.0 / (n + 1.0)).sqrt();

    let (loc, std) = fit_normal_mean(&y, 2000, 0)?;
    assert!((loc - post_mean).abs() < 0.1, "loc {} vs {}", loc, post_mean);
    assert!((std - post_std).abs() < 0.08, "std {} vs {}", std, post_std);
    Ok(())
}

#[test]
fn same_seed_same_variational_fit() -> Result<()> {
    let y = vec![0.3f32, -0.2, 0.5];
    assert_eq!(fit_normal_mean(&y, 50, 11)?, fit_normal_mean(&y, 50, 11)?);
    Ok(())
}

#[test]
fn interval_latent_keeps_finite_elbo() -> Result<()> {
    let device = Device::Cpu;
    let transform = IntervalTransform::new(0.0, 5.0);
    let prior = UniformPrior::new(0.0, 5.0);

    let u = Tensor::new(&[[-25.0f32], [-3.0], [0.0], [3.0], [25.0]], &device)?;
    let v = transform.forward(&u)?;
    let log_det = transform.log_abs_det_jacobian(&u)?.sum(1)?;
    let log_prior = prior.log_prob(&v)?.sum(1)?;

    for x in (log_prior - log_det)?.to_vec1::<f32>()? {
        assert!(x.is_finite());
    }
    Ok(())
}
