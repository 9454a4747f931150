use crate::common::*;
use crate::dataset::check_finite;
use crate::guide::GuideState;
use crate::model::GenerativeModel;

use log::info;
use ndarray::{concatenate, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

/// Posterior-predictive draws on a fixed input grid.
///
/// Rows are draws, columns are grid points (or latents for `latents`).
#[derive(Debug, Clone)]
pub struct PredictiveBundle {
    /// input grid, length N
    pub x: Vec<f32>,
    /// mean function w * x + b: S x N (epistemic uncertainty)
    pub prediction: Mat,
    /// mean plus Gaussian noise: S x N (total predictive uncertainty)
    pub obs: Mat,
    /// latent draws: S x 3, columns as `Latent::ALL`
    pub latents: Mat,
}

impl PredictiveBundle {
    pub fn num_samples(&self) -> usize {
        self.prediction.nrows()
    }

    pub fn num_points(&self) -> usize {
        self.x.len()
    }
}

/// Draws `(w, b, σ)` from a trained guide and pushes them through the
/// model to predictive samples.
pub struct PosteriorSampler<'a> {
    model: &'a GenerativeModel,
    guide: &'a GuideState,
    samples_per_chunk: usize,
}

impl<'a> PosteriorSampler<'a> {
    pub fn new(model: &'a GenerativeModel, guide: &'a GuideState) -> Self {
        Self {
            model,
            guide,
            samples_per_chunk: SAMPLES_PER_CHUNK,
        }
    }

    pub fn with_chunk_size(mut self, samples_per_chunk: usize) -> Self {
        self.samples_per_chunk = samples_per_chunk.max(1);
        self
    }

    /// `num_samples` posterior-predictive draws at every point of `x`
    ///
    /// Chunks of draws run in parallel, chunk `c` on its own
    /// `StdRng::seed_from_u64(seed + c)`. The bundle is a function of
    /// `seed` and the chunk size, never of the thread schedule.
    ///
    /// Consecutive seeds share streams (chunk 1 of `seed` is chunk 0 of
    /// `seed + 1`); space seeds by more than the chunk count for
    /// independent runs.
    pub fn predict(&self, x: &[f32], num_samples: usize, seed: u64) -> Result<PredictiveBundle> {
        if num_samples == 0 {
            return Err(LentilError::configuration("number of posterior samples must be at least 1"));
        }
        if x.is_empty() {
            return Err(LentilError::invalid_input("empty prediction grid"));
        }
        check_finite("x", x)?;

        let device = self.guide.device();
        let x_tensor = Tensor::from_slice(x, x.len(), device)?;

        let chunk_sizes: Vec<usize> = (0..num_samples)
            .step_by(self.samples_per_chunk)
            .map(|start| self.samples_per_chunk.min(num_samples - start))
            .collect();

        info!(
            "drawing {} posterior-predictive samples at {} points",
            num_samples,
            x.len()
        );

        let chunks = chunk_sizes
            .par_iter()
            .enumerate()
            .map(|(c, &size)| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(c as u64));
                self.draw_chunk(&x_tensor, size, &mut rng)
            })
            .collect::<Result<Vec<_>>>()?;

        let bundle = PredictiveBundle {
            x: x.to_vec(),
            prediction: stack_rows(chunks.iter().map(|c| &c.0))?,
            obs: stack_rows(chunks.iter().map(|c| &c.1))?,
            latents: stack_rows(chunks.iter().map(|c| &c.2))?,
        };

        for (name, mat) in [("prediction", &bundle.prediction), ("obs", &bundle.obs)] {
            if mat.iter().any(|v| !v.is_finite()) {
                return Err(LentilError::numerical(format!(
                    "non-finite posterior-predictive {} sample",
                    name
                )));
            }
        }

        Ok(bundle)
    }

    /// (prediction, obs, latents) for one chunk, without gradients
    fn draw_chunk(&self, x: &Tensor, size: usize, rng: &mut StdRng) -> Result<(Mat, Mat, Mat)> {
        let draw = self.guide.sample(rng, size)?.detach();
        let trace = self.model.predict(x, &draw, rng)?;
        let obs = trace
            .obs
            .ok_or_else(|| LentilError::numerical("prediction mode produced no observations"))?;

        Ok((to_mat(&trace.mean)?, to_mat(&obs)?, draw.to_mat()?))
    }
}

/// Posterior-predictive draws with the default chunking
pub fn predict(
    model: &GenerativeModel,
    guide: &GuideState,
    x: &[f32],
    num_samples: usize,
    seed: u64,
) -> Result<PredictiveBundle> {
    PosteriorSampler::new(model, guide).predict(x, num_samples, seed)
}

fn stack_rows<'a>(mats: impl Iterator<Item = &'a Mat>) -> Result<Mat> {
    let views: Vec<_> = mats.map(|m| m.view()).collect();
    concatenate(Axis(0), &views).map_err(|e| LentilError::invalid_input(e.to_string()))
}

fn to_mat(t: &Tensor) -> Result<Mat> {
    let (rows, cols) = t.dims2()?;
    let flat = t.to_dtype(DType::F32)?.flatten_all()?.to_vec1::<f32>()?;
    Mat::from_shape_vec((rows, cols), flat).map_err(|e| LentilError::invalid_input(e.to_string()))
}
