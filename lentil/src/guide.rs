use crate::common::*;
use crate::model::{GenerativeModel, Latent, LatentDraw};

use candle_util::sgvb::{ConstraintTransform, GaussianVariational, IntervalTransform, VariationalDistribution};
use rand::Rng;

/// Mean-field normal guide over the unconstrained latents.
///
/// ```text
/// u = (u_w, u_b, u_σ) ~ N(loc, diag(scale²))
/// w = u_w,  b = u_b,  σ = low + (high - low) * sigmoid(u_σ)
/// ```
///
/// Every run builds its own `GuideState`; parameters live in a private
/// `VarMap` and never leak between runs.
pub struct GuideState {
    varmap: VarMap,
    variational: GaussianVariational,
    sigma_transform: IntervalTransform,
}

/// Point values of the three latents
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatentValues {
    pub weight: f32,
    pub bias: f32,
    pub sigma: f32,
}

impl LatentValues {
    pub fn get(&self, latent: Latent) -> f32 {
        match latent {
            Latent::Weight => self.weight,
            Latent::Bias => self.bias,
            Latent::Sigma => self.sigma,
        }
    }

    fn from_slice(values: &[f32]) -> Self {
        Self {
            weight: values[Latent::Weight.index()],
            bias: values[Latent::Bias.index()],
            sigma: values[Latent::Sigma.index()],
        }
    }
}

impl GuideState {
    /// Fresh guide parameters for `model`: loc = 0, scale = `init_scale`
    pub fn new(model: &GenerativeModel, init_scale: f64, device: &Device) -> Result<Self> {
        if !(init_scale > 0.0 && init_scale.is_finite()) {
            return Err(LentilError::configuration(format!(
                "initial guide scale must be positive: {}",
                init_scale
            )));
        }

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let variational = GaussianVariational::new(vb.pp("guide"), Latent::COUNT, init_scale)?;

        let (low, high) = model.sigma_support();

        Ok(Self {
            varmap,
            variational,
            sigma_transform: IntervalTransform::new(low, high),
        })
    }

    /// The trainable tensors, for the optimizer
    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    pub fn device(&self) -> &Device {
        self.variational.device()
    }

    pub fn sigma_transform(&self) -> &IntervalTransform {
        &self.sigma_transform
    }

    /// Draw `num_draws` joint samples via reparameterization.
    ///
    /// The returned log density is that of the constrained draw:
    /// `log N(u; loc, scale) - log |dσ/du_σ|`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, num_draws: usize) -> Result<LatentDraw> {
        let u = self.variational.sample_with(rng, num_draws)?;
        self.constrain(&u)
    }

    /// Map unconstrained draws (S, 3) to a `LatentDraw`
    pub fn constrain(&self, u: &Tensor) -> Result<LatentDraw> {
        let column = |latent: Latent| -> Result<Tensor> {
            Ok(u.narrow(1, latent.index(), 1)?.squeeze(1)?)
        };

        let u_sigma = column(Latent::Sigma)?;
        let sigma = self.sigma_transform.forward(&u_sigma)?;
        let log_det = self.sigma_transform.log_abs_det_jacobian(&u_sigma)?;
        let log_q = (self.variational.log_prob(u)? - log_det)?;

        Ok(LatentDraw {
            weight: column(Latent::Weight)?,
            bias: column(Latent::Bias)?,
            sigma,
            log_q,
        })
    }

    /// Variational location per latent, unconstrained
    pub fn loc(&self) -> Result<LatentValues> {
        let loc = self.variational.loc().to_vec1::<f32>()?;
        Ok(LatentValues::from_slice(&loc))
    }

    /// Variational scale per latent, unconstrained
    pub fn scale(&self) -> Result<LatentValues> {
        let scale = self.variational.std()?.to_vec1::<f32>()?;
        Ok(LatentValues::from_slice(&scale))
    }

    /// Guide median in the constrained space: the transform of `loc`
    pub fn median(&self) -> Result<LatentValues> {
        let loc = self.variational.loc().detach().unsqueeze(0)?;
        let draw = self.constrain(&loc)?;
        let value = |t: &Tensor| -> Result<f32> { Ok(t.to_vec1::<f32>()?[0]) };
        Ok(LatentValues {
            weight: value(&draw.weight)?,
            bias: value(&draw.bias)?,
            sigma: value(&draw.sigma)?,
        })
    }

    /// Posterior variance per latent in the unconstrained space
    pub fn var(&self) -> Result<LatentValues> {
        let var = self.variational.var()?.to_vec1::<f32>()?;
        Ok(LatentValues::from_slice(&var))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn fresh_guide_starts_at_origin() -> anyhow::Result<()> {
        let guide = GuideState::new(&GenerativeModel::default(), 0.1, &Device::Cpu)?;
        let loc = guide.loc()?;
        let scale = guide.scale()?;
        for latent in Latent::ALL {
            assert_eq!(loc.get(latent), 0.0);
            assert!((scale.get(latent) - 0.1).abs() < 1e-6);
        }
        // sigmoid(0) is the midpoint of (0, 5)
        assert!((guide.median()?.sigma - 2.5).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn draws_respect_sigma_support() -> anyhow::Result<()> {
        let guide = GuideState::new(&GenerativeModel::default(), 3.0, &Device::Cpu)?;
        let draw = guide.sample(&mut StdRng::seed_from_u64(5), 500)?;

        assert_eq!(draw.num_draws()?, 500);
        assert_eq!(draw.log_q.dims(), &[500]);
        for s in draw.sigma.to_vec1::<f32>()? {
            assert!((0.0..=5.0).contains(&s), "sigma = {}", s);
        }
        assert!(draw.log_q.to_vec1::<f32>()?.iter().all(|l| l.is_finite()));
        Ok(())
    }

    #[test]
    fn sigma_round_trips_through_its_transform() -> anyhow::Result<()> {
        let guide = GuideState::new(&GenerativeModel::default(), 1.0, &Device::Cpu)?;
        let draw = guide.sample(&mut StdRng::seed_from_u64(9), 64)?;

        let transform = guide.sigma_transform();
        let u = transform.inverse(&draw.sigma)?;
        let back = transform.forward(&u)?;
        for (a, b) in draw.sigma.to_vec1::<f32>()?.iter().zip(back.to_vec1::<f32>()?) {
            assert!((a - b).abs() < 1e-4, "{} vs {}", a, b);
        }
        Ok(())
    }

    #[test]
    fn log_q_includes_jacobian() -> anyhow::Result<()> {
        let guide = GuideState::new(&GenerativeModel::default(), 1.0, &Device::Cpu)?;
        let u = Tensor::new(&[[0.0f32, 0.0, 0.0]], &Device::Cpu)?;
        let draw = guide.constrain(&u)?;

        // standard normal at the origin in 3 dims, minus log(5 * 1/4)
        let ln_2pi = (2.0 * std::f64::consts::PI).ln();
        let expected = -1.5 * ln_2pi - (5.0f64 * 0.25).ln();
        let actual = draw.log_q.to_vec1::<f32>()?[0] as f64;
        approx::assert_abs_diff_eq!(actual, expected, epsilon = 1e-5);
        Ok(())
    }

    #[test]
    fn same_seed_same_draws() -> anyhow::Result<()> {
        let guide = GuideState::new(&GenerativeModel::default(), 1.0, &Device::Cpu)?;
        let a = guide.sample(&mut StdRng::seed_from_u64(1), 8)?.to_mat()?;
        let b = guide.sample(&mut StdRng::seed_from_u64(1), 8)?.to_mat()?;
        assert_eq!(a, b);
        Ok(())
    }
}
