use candle_core::{Device, Result};
use candle_nn::{AdamW, Optimizer, ParamsAdamW, VarMap};
use clap::ValueEnum;

/// Compute device selection.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[clap(rename_all = "lowercase")]
pub enum ComputeDevice {
    #[default]
    Cpu,
    Cuda,
    Metal,
}

impl ComputeDevice {
    /// Create a candle `Device` from this enum. Fails when the backend
    /// was not compiled in (see the `cuda` and `metal` features).
    pub fn to_device(&self, device_no: usize) -> Result<Device> {
        Ok(match self {
            ComputeDevice::Metal => Device::new_metal(device_no)?,
            ComputeDevice::Cuda => Device::new_cuda(device_no)?,
            ComputeDevice::Cpu => Device::Cpu,
        })
    }
}

#[derive(Clone, Debug)]
pub struct TrainConfig {
    pub learning_rate: f32,
    pub num_epochs: usize,
    /// log the loss every this many epochs
    pub report_every: usize,
    pub device: Device,
    pub verbose: bool,
    pub show_progress: bool,
}

impl TrainConfig {
    pub fn new(learning_rate: f32, num_epochs: usize) -> Self {
        Self {
            learning_rate,
            num_epochs,
            ..Default::default()
        }
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            num_epochs: 1000,
            report_every: 100,
            device: Device::Cpu,
            verbose: false,
            show_progress: false,
        }
    }
}

/// Plain Adam over every variable in `varmap` (AdamW without decay)
pub fn adam(varmap: &VarMap, learning_rate: f32) -> Result<AdamW> {
    AdamW::new(
        varmap.all_vars(),
        ParamsAdamW {
            lr: learning_rate.into(),
            weight_decay: 0.0,
            ..Default::default()
        },
    )
}
