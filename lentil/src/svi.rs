use crate::common::*;
use crate::dataset::Dataset;
use crate::guide::GuideState;
use crate::model::GenerativeModel;
use crate::point_estimate::validate_train_config;

use candle_util::candle_inference::{adam, TrainConfig};
use candle_util::candle_nn::AdamW;
use candle_util::sgvb::{compute_elbo, direct_elbo_loss};
use indicatif::{ProgressBar, ProgressDrawTarget};
use log::{debug, info};
use rand::Rng;

#[derive(Clone, Debug)]
pub struct SviConfig {
    pub train: TrainConfig,
    /// Monte Carlo particles per ELBO gradient
    pub num_particles: usize,
    /// initial guide scale in the unconstrained space
    pub init_scale: f64,
}

impl Default for SviConfig {
    fn default() -> Self {
        Self {
            train: TrainConfig {
                learning_rate: DEFAULT_LEARNING_RATE,
                num_epochs: DEFAULT_SVI_EPOCHS,
                report_every: DEFAULT_REPORT_EVERY,
                ..Default::default()
            },
            num_particles: DEFAULT_NUM_PARTICLES,
            init_scale: DEFAULT_INIT_SCALE,
        }
    }
}

impl SviConfig {
    pub fn validate(&self) -> Result<()> {
        validate_train_config(&self.train)?;
        if self.num_particles == 0 {
            return Err(LentilError::configuration("number of particles must be at least 1"));
        }
        Ok(())
    }
}

/// Loss per epoch of one SVI run
#[derive(Debug, Clone, Default)]
pub struct SviTrace {
    /// negative ELBO summed over data points, one per epoch
    pub losses: Vec<f32>,
    /// number of data points, to report per-point losses
    pub num_obs: usize,
}

impl SviTrace {
    pub fn per_point(&self) -> Vec<f32> {
        let n = self.num_obs.max(1) as f32;
        self.losses.iter().map(|l| l / n).collect()
    }

    pub fn last(&self) -> Option<f32> {
        self.losses.last().copied()
    }
}

/// Stochastic variational inference on the ELBO.
///
/// Owns the guide parameters and their Adam state for the whole run.
/// Nothing else can touch the guide until `finish` hands it over.
pub struct SviEngine {
    model: GenerativeModel,
    guide: GuideState,
    optimizer: AdamW,
    config: SviConfig,
}

impl SviEngine {
    /// Fresh guide parameters and a fresh optimizer
    pub fn new(model: GenerativeModel, config: SviConfig) -> Result<Self> {
        config.validate()?;
        let guide = GuideState::new(&model, config.init_scale, &config.train.device)?;
        let optimizer = adam(guide.varmap(), config.train.learning_rate)?;
        Ok(Self {
            model,
            guide,
            optimizer,
            config,
        })
    }

    pub fn model(&self) -> &GenerativeModel {
        &self.model
    }

    pub fn config(&self) -> &SviConfig {
        &self.config
    }

    /// One gradient step on the full data.
    ///
    /// * `x`, `y` - (n,) tensors on the engine's device
    ///
    /// Returns the negative ELBO summed over data points. A non-finite
    /// value is reported before any parameter moves.
    pub fn step<R: Rng + ?Sized>(&mut self, x: &Tensor, y: &Tensor, rng: &mut R) -> Result<f32> {
        let draw = self.guide.sample(rng, self.config.num_particles)?;
        let sample = self.model.elbo_sample(x, y, &draw)?;
        let loss = direct_elbo_loss(&sample)?;

        let loss_val = loss.to_scalar::<f32>()?;
        if !loss_val.is_finite() {
            return Err(LentilError::numerical(format!(
                "ELBO loss became {}; guide loc = {:?}",
                loss_val,
                self.guide.loc()?
            )));
        }

        self.optimizer.backward_step(&loss)?;
        Ok(loss_val)
    }

    /// `num_epochs` steps over the full data set
    pub fn run<R: Rng + ?Sized>(&mut self, data: &Dataset, rng: &mut R) -> Result<SviTrace> {
        let train = self.config.train.clone();
        let (x, y) = data.to_tensors(self.guide.device())?;
        let n = data.len();

        let pb = ProgressBar::new(train.num_epochs as u64);
        if !train.show_progress || train.verbose {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        }

        info!(
            "SVI: {} epochs, lr = {}, {} particle(s), {} points",
            train.num_epochs, train.learning_rate, self.config.num_particles, n
        );

        let mut losses = Vec::with_capacity(train.num_epochs);

        for epoch in 0..train.num_epochs {
            let loss = match self.step(&x, &y, rng) {
                Ok(loss) => loss,
                Err(e) => {
                    pb.finish_and_clear();
                    return Err(e);
                }
            };
            losses.push(loss);
            pb.inc(1);

            if epoch % train.report_every == 0 || epoch + 1 == train.num_epochs {
                if train.verbose {
                    info!("[{}] ELBO loss: {:.4}", epoch + 1, loss / n as f32);
                } else {
                    debug!("[{}] ELBO loss: {:.4}", epoch + 1, loss / n as f32);
                }
            }
        }
        pb.finish_and_clear();

        let median = self.guide.median()?;
        info!(
            "guide median: w = {:.4}, b = {:.4}, sigma = {:.4}",
            median.weight, median.bias, median.sigma
        );

        Ok(SviTrace { losses, num_obs: n })
    }

    /// Monte Carlo ELBO with `num_particles` draws; parameters stay put
    pub fn elbo<R: Rng + ?Sized>(&self, data: &Dataset, rng: &mut R, num_particles: usize) -> Result<f32> {
        if num_particles == 0 {
            return Err(LentilError::configuration("number of particles must be at least 1"));
        }
        let (x, y) = data.to_tensors(self.guide.device())?;
        let draw = self.guide.sample(rng, num_particles)?.detach();
        let sample = self.model.elbo_sample(&x, &y, &draw)?;
        Ok(compute_elbo(&sample)?.to_scalar::<f32>()?)
    }

    /// Read-only view of the guide between steps
    pub fn guide(&self) -> &GuideState {
        &self.guide
    }

    /// End training and hand over the trained guide
    pub fn finish(self) -> GuideState {
        self.guide
    }
}

/// Train a fresh guide on `data`
pub fn fit<R: Rng + ?Sized>(
    data: &Dataset,
    model: GenerativeModel,
    config: SviConfig,
    rng: &mut R,
) -> Result<(GuideState, SviTrace)> {
    let mut engine = SviEngine::new(model, config)?;
    let trace = engine.run(data, rng)?;
    Ok((engine.finish(), trace))
}
