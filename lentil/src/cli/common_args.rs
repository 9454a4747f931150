use candle_util::candle_inference::{ComputeDevice, TrainConfig};
use clap::Args;
use lentil::dataset::SimArgs;

/// Simulation, optimizer and device options shared by every command
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    #[arg(long, default_value = "100", help = "Number of simulated points on [0, 1]")]
    pub n: usize,

    #[arg(long, default_value = "2.0", allow_hyphen_values = true, help = "True slope")]
    pub weight: f32,

    #[arg(long, default_value = "1.0", allow_hyphen_values = true, help = "True intercept")]
    pub bias: f32,

    #[arg(long, default_value = "0.2", help = "Noise standard deviation")]
    pub noise: f32,

    #[arg(long, default_value = "42", help = "Random seed")]
    pub seed: u64,

    #[arg(long, default_value = "0.01", help = "Adam learning rate")]
    pub lr: f32,

    #[arg(long, default_value = "100", help = "Log the loss every this many epochs")]
    pub report_every: usize,

    #[arg(
        long,
        value_enum,
        default_value = "cpu",
        help = "Compute device (cuda/metal need the matching cargo feature)"
    )]
    pub device: ComputeDevice,

    #[arg(long, default_value = "0", help = "Device number for cuda or metal")]
    pub device_no: usize,
}

impl CommonArgs {
    pub fn sim_args(&self) -> SimArgs {
        SimArgs {
            num_points: self.n,
            weight: self.weight,
            bias: self.bias,
            noise_sd: self.noise,
        }
    }

    pub fn train_config(&self, num_epochs: usize, verbose: bool) -> anyhow::Result<TrainConfig> {
        Ok(TrainConfig {
            learning_rate: self.lr,
            num_epochs,
            report_every: self.report_every,
            device: self.device.to_device(self.device_no)?,
            verbose,
            show_progress: true,
        })
    }
}

/// One row per input point, tab-separated, header first
pub fn print_tsv(header: &[&str], columns: &[&[f32]]) {
    println!("{}", header.join("\t"));
    let n = columns.iter().map(|c| c.len()).min().unwrap_or(0);
    for i in 0..n {
        let row: Vec<String> = columns.iter().map(|c| format!("{:.6}", c[i])).collect();
        println!("{}", row.join("\t"));
    }
}
