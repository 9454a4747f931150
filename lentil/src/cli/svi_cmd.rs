use crate::cli::common_args::*;

use clap::Args;
use lentil::common::*;
use lentil::dataset::simulate_linear;
use lentil::model::GenerativeModel;
use lentil::posterior::PosteriorSampler;
use lentil::summary::{summarize, summarize_latents};
use lentil::svi::{self, SviConfig};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Args, Debug)]
pub struct SviArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(long, default_value_t = DEFAULT_SVI_EPOCHS, help = "Number of SVI steps")]
    pub epochs: usize,

    #[arg(long, default_value_t = DEFAULT_NUM_PARTICLES, help = "Monte Carlo particles per ELBO gradient")]
    pub particles: usize,

    #[arg(long, default_value_t = DEFAULT_INIT_SCALE, help = "Initial guide scale")]
    pub init_scale: f64,

    #[arg(long, default_value_t = DEFAULT_POSTERIOR_SAMPLES, help = "Posterior-predictive draws")]
    pub samples: usize,

    #[arg(long, default_value_t = PREDICTION_QUANTILES.0, help = "Lower quantile of the regression-line band")]
    pub pred_lower_q: f32,

    #[arg(long, default_value_t = PREDICTION_QUANTILES.1, help = "Upper quantile of the regression-line band")]
    pub pred_upper_q: f32,

    #[arg(long, default_value_t = OBS_QUANTILES.0, help = "Lower quantile of the predictive band")]
    pub obs_lower_q: f32,

    #[arg(long, default_value_t = OBS_QUANTILES.1, help = "Upper quantile of the predictive band")]
    pub obs_upper_q: f32,
}

pub fn fit_svi(args: &SviArgs, verbose: bool) -> anyhow::Result<()> {
    let common = &args.common;
    let mut rng = StdRng::seed_from_u64(common.seed);
    let data = simulate_linear(&common.sim_args(), &mut rng)?;
    info!("simulated {} points", data.len());

    let config = SviConfig {
        train: common.train_config(args.epochs, verbose)?,
        num_particles: args.particles,
        init_scale: args.init_scale,
    };

    let model = GenerativeModel::default();
    let (guide, trace) = svi::fit(&data, model.clone(), config, &mut rng)?;

    if let Some(loss) = trace.last() {
        info!("final ELBO loss per point: {:.4}", loss / data.len() as f32);
    }

    let (loc, scale) = (guide.loc()?, guide.scale()?);
    info!(
        "guide loc: w = {:.4}, b = {:.4}, u_sigma = {:.4}",
        loc.weight, loc.bias, loc.sigma
    );
    info!(
        "guide scale: w = {:.4}, b = {:.4}, u_sigma = {:.4}",
        scale.weight, scale.bias, scale.sigma
    );

    let bundle = PosteriorSampler::new(&model, &guide).predict(
        data.x(),
        args.samples,
        common.seed.wrapping_add(1),
    )?;

    for s in summarize_latents(&bundle, args.obs_lower_q, args.obs_upper_q)? {
        info!(
            "{}: mean = {:.4}, sd = {:.4}, [{:.4}, {:.4}]",
            s.latent, s.mean, s.sd, s.lower, s.upper
        );
    }

    let prediction = summarize(&bundle.prediction, args.pred_lower_q, args.pred_upper_q)?;
    let obs = summarize(&bundle.obs, args.obs_lower_q, args.obs_upper_q)?;

    print_tsv(
        &[
            "x",
            "y",
            "prediction_mean",
            "prediction_lower",
            "prediction_upper",
            "obs_mean",
            "obs_lower",
            "obs_upper",
        ],
        &[
            data.x(),
            data.y(),
            &prediction.mean[..],
            &prediction.lower[..],
            &prediction.upper[..],
            &obs.mean[..],
            &obs.lower[..],
            &obs.upper[..],
        ],
    );
    Ok(())
}
