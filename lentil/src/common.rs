pub const DEFAULT_LEARNING_RATE: f32 = 0.01;
pub const DEFAULT_POINT_EPOCHS: usize = 1000;
pub const DEFAULT_SVI_EPOCHS: usize = 3000;
pub const DEFAULT_REPORT_EVERY: usize = 100;
pub const DEFAULT_NUM_PARTICLES: usize = 1;
pub const DEFAULT_INIT_SCALE: f64 = 0.1;
pub const DEFAULT_POSTERIOR_SAMPLES: usize = 1000;

/// quantile levels for the regression line (epistemic) band
pub const PREDICTION_QUANTILES: (f32, f32) = (0.001, 0.999);
/// quantile levels for the full predictive (obs) band
pub const OBS_QUANTILES: (f32, f32) = (0.05, 0.95);

/// posterior-predictive draws per parallel chunk
pub const SAMPLES_PER_CHUNK: usize = 250;

pub use candle_util::candle_core::{DType, Device, Tensor};
pub use candle_util::candle_nn::{Optimizer, VarBuilder, VarMap};

pub use crate::error::{LentilError, Result};

pub type Mat = ndarray::Array2<f32>;
