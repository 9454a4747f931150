use crate::cli::common_args::*;

use clap::Args;
use lentil::common::*;
use lentil::dataset::simulate_linear;
use lentil::point_estimate;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Args, Debug)]
pub struct PointArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(long, default_value_t = DEFAULT_POINT_EPOCHS, help = "Number of full-batch epochs")]
    pub epochs: usize,
}

pub fn fit_point(args: &PointArgs, verbose: bool) -> anyhow::Result<()> {
    let common = &args.common;
    let mut rng = StdRng::seed_from_u64(common.seed);
    let data = simulate_linear(&common.sim_args(), &mut rng)?;
    info!("simulated {} points", data.len());

    let config = common.train_config(args.epochs, verbose)?;
    let fitted = point_estimate::fit(&data, &config)?;

    info!(
        "w = {:.4} (true {}), b = {:.4} (true {})",
        fitted.weight, common.weight, fitted.bias, common.bias
    );

    let y_hat = fitted.predict(data.x());
    print_tsv(&["x", "y", "y_hat"], &[data.x(), data.y(), &y_hat[..]]);
    Ok(())
}
