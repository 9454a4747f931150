use crate::common::*;
use crate::dataset::Dataset;

use candle_util::candle_inference::{adam, TrainConfig};
use candle_util::candle_nn::{loss, Linear, Module};
use indicatif::{ProgressBar, ProgressDrawTarget};
use log::info;

/// Point estimate of `y = w * x + b`
#[derive(Debug, Clone)]
pub struct FittedParams {
    pub weight: f32,
    pub bias: f32,
    /// mean squared error before each update
    pub loss_trace: Vec<f32>,
}

impl FittedParams {
    pub fn predict(&self, x: &[f32]) -> Vec<f32> {
        x.iter().map(|&x_i| self.weight * x_i + self.bias).collect()
    }
}

/// A one-input, one-output affine map trained on mean squared error
pub struct DeterministicRegressor {
    varmap: VarMap,
    linear: Linear,
    device: Device,
}

impl DeterministicRegressor {
    /// Zero-initialized weight and bias, so the fit depends on nothing
    /// but the data and the configuration.
    pub fn new(device: &Device) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let weight = vb.get_with_hints((1, 1), "weight", candle_util::candle_nn::Init::Const(0.0))?;
        let bias = vb.get_with_hints(1, "bias", candle_util::candle_nn::Init::Const(0.0))?;
        Ok(Self {
            varmap,
            linear: Linear::new(weight, Some(bias)),
            device: device.clone(),
        })
    }

    /// Full-batch Adam on the mean squared error
    ///
    /// * `data` - training pairs
    /// * `config` - learning rate, number of epochs, reporting cadence
    pub fn fit(&mut self, data: &Dataset, config: &TrainConfig) -> Result<FittedParams> {
        validate_train_config(config)?;

        let n = data.len();
        let (x, y) = data.to_tensors(&self.device)?;
        let x_n1 = x.reshape((n, 1))?;
        let y_n1 = y.reshape((n, 1))?;

        let mut optimizer = adam(&self.varmap, config.learning_rate)?;

        let pb = ProgressBar::new(config.num_epochs as u64);
        if !config.show_progress || config.verbose {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        }

        let mut loss_trace = Vec::with_capacity(config.num_epochs);

        for epoch in 0..config.num_epochs {
            let y_hat = self.linear.forward(&x_n1)?;
            let mse = loss::mse(&y_hat, &y_n1)?;
            let mse_val = mse.to_scalar::<f32>()?;

            if !mse_val.is_finite() {
                pb.finish_and_clear();
                return Err(LentilError::numerical(format!(
                    "mean squared error became {} at epoch {}",
                    mse_val, epoch
                )));
            }

            optimizer.backward_step(&mse)?;
            loss_trace.push(mse_val);
            pb.inc(1);

            if config.verbose && (epoch % config.report_every == 0 || epoch + 1 == config.num_epochs) {
                info!("[{}] mse: {:.6}", epoch + 1, mse_val);
            }
        }
        pb.finish_and_clear();

        let (weight, bias) = self.coefficients()?;
        info!("point estimate: w = {:.4}, b = {:.4}", weight, bias);

        Ok(FittedParams {
            weight,
            bias,
            loss_trace,
        })
    }

    pub fn coefficients(&self) -> Result<(f32, f32)> {
        let weight = self.linear.weight().flatten_all()?.to_vec1::<f32>()?[0];
        let bias = match self.linear.bias() {
            Some(b) => b.to_vec1::<f32>()?[0],
            None => 0.0,
        };
        Ok((weight, bias))
    }
}

/// Fit a fresh zero-initialized regressor
pub fn fit(data: &Dataset, config: &TrainConfig) -> Result<FittedParams> {
    DeterministicRegressor::new(&config.device)?.fit(data, config)
}

pub(crate) fn validate_train_config(config: &TrainConfig) -> Result<()> {
    if !(config.learning_rate > 0.0 && config.learning_rate.is_finite()) {
        return Err(LentilError::configuration(format!(
            "learning rate must be positive: {}",
            config.learning_rate
        )));
    }
    if config.num_epochs == 0 {
        return Err(LentilError::configuration("number of epochs must be at least 1"));
    }
    if config.report_every == 0 {
        return Err(LentilError::configuration("reporting interval must be at least 1"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{simulate_linear, SimArgs};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn block_means(trace: &[f32], block: usize) -> Vec<f32> {
        trace
            .chunks(block)
            .map(|c| c.iter().sum::<f32>() / c.len() as f32)
            .collect()
    }

    #[test]
    fn mse_decreases_over_epochs() -> anyhow::Result<()> {
        let data = simulate_linear(&SimArgs::default(), &mut StdRng::seed_from_u64(42))?;
        let fitted = fit(&data, &TrainConfig::new(0.01, 1000))?;

        assert_eq!(fitted.loss_trace.len(), 1000);
        let means = block_means(&fitted.loss_trace, 100);
        for pair in means.windows(2) {
            assert!(pair[1] <= pair[0] + 1e-3, "block means went up: {:?}", means);
        }
        assert!(means.last().unwrap() < &(means[0] * 0.1));
        Ok(())
    }

    #[test]
    fn recovers_the_line() -> anyhow::Result<()> {
        let args = SimArgs {
            noise_sd: 0.0,
            ..Default::default()
        };
        let data = simulate_linear(&args, &mut StdRng::seed_from_u64(0))?;
        let fitted = fit(&data, &TrainConfig::new(0.02, 3000))?;

        assert!((fitted.weight - 2.0).abs() < 0.1, "w = {}", fitted.weight);
        assert!((fitted.bias - 1.0).abs() < 0.1, "b = {}", fitted.bias);

        let y_hat = fitted.predict(&[0.0, 1.0]);
        assert!((y_hat[1] - y_hat[0] - fitted.weight).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn single_point_stays_finite() -> anyhow::Result<()> {
        let data = Dataset::new(vec![0.5], vec![3.0])?;
        let fitted = fit(&data, &TrainConfig::new(0.01, 200))?;
        assert!(fitted.weight.is_finite());
        assert!(fitted.bias.is_finite());
        assert!(fitted.loss_trace.iter().all(|l| l.is_finite()));
        Ok(())
    }

    #[test]
    fn rejects_bad_configuration() -> anyhow::Result<()> {
        let data = Dataset::new(vec![0.0, 1.0], vec![1.0, 3.0])?;

        let res = fit(&data, &TrainConfig::new(0.0, 10));
        assert!(matches!(res, Err(LentilError::Configuration(_))));

        let res = fit(&data, &TrainConfig::new(0.01, 0));
        assert!(matches!(res, Err(LentilError::Configuration(_))));
        Ok(())
    }
}
