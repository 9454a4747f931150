//! Fit the Bayesian line on simulated data and check what comes out.
//!
//! Run: cargo test -p lentil --test end_to_end -- --nocapture

use anyhow::Result;
use lentil::common::*;
use lentil::dataset::{linspace, simulate_linear, simulate_response, Dataset, SimArgs};
use lentil::model::{GenerativeModel, Latent};
use lentil::posterior::{self, PosteriorSampler};
use lentil::summary::{coverage, summarize, summarize_latents};
use lentil::svi::{self, SviConfig};
use rand::prelude::*;

#[test]
fn noiseless_line_is_recovered() -> Result<()> {
    let x = linspace(0.0, 1.0, 100);
    let y: Vec<f32> = x.iter().map(|&x_i| 2.0 * x_i + 1.0).collect();
    let data = Dataset::new(x, y)?;

    let mut rng = StdRng::seed_from_u64(0);
    let (guide, trace) = svi::fit(&data, GenerativeModel::default(), SviConfig::default(), &mut rng)?;

    let loc = guide.loc()?;
    println!("loc: w = {:.4}, b = {:.4}", loc.weight, loc.bias);
    assert_eq!(trace.losses.len(), DEFAULT_SVI_EPOCHS);
    assert!((loc.weight - 2.0).abs() < 0.2, "w = {}", loc.weight);
    assert!((loc.bias - 1.0).abs() < 0.2, "b = {}", loc.bias);
    Ok(())
}

#[test]
fn predictive_band_covers_held_out_data() -> Result<()> {
    let args = SimArgs::default();
    let mut rng = StdRng::seed_from_u64(1);
    let data = simulate_linear(&args, &mut rng)?;

    let model = GenerativeModel::default();
    let (guide, _) = svi::fit(&data, model.clone(), SviConfig::default(), &mut rng)?;

    let bundle = posterior::predict(&model, &guide, data.x(), 2000, 7)?;
    let (lq, uq) = OBS_QUANTILES;
    let obs = summarize(&bundle.obs, lq, uq)?;

    let (plq, puq) = PREDICTION_QUANTILES;
    let prediction = summarize(&bundle.prediction, plq, puq)?;
    for i in 0..obs.len() {
        // the line band is narrower than the band with noise
        assert!(prediction.upper[i] - prediction.lower[i] <= obs.upper[i] - obs.lower[i] + 1e-3);
    }

    let replicates = 20;
    let mut covered = 0.0;
    for _ in 0..replicates {
        let held_out = simulate_response(&args, data.x(), &mut rng)?;
        covered += coverage(&obs, &held_out)?;
    }
    let covered = covered / replicates as f32;
    println!("held-out coverage of the 90% band: {:.3}", covered);
    assert!(covered >= 0.85, "coverage = {}", covered);

    let latents = summarize_latents(&bundle, 0.05, 0.95)?;
    let sigma = latents[Latent::Sigma.index()];
    assert!((sigma.mean - args.noise_sd).abs() < 0.1, "sigma = {}", sigma.mean);
    Ok(())
}

#[test]
fn std_error_shrinks_on_trained_guide() -> Result<()> {
    let args = SimArgs::default();
    let mut rng = StdRng::seed_from_u64(5);
    let data = simulate_linear(&args, &mut rng)?;

    let model = GenerativeModel::default();
    let (guide, _) = svi::fit(&data, model.clone(), SviConfig::default(), &mut rng)?;

    let (lq, uq) = OBS_QUANTILES;
    let small = summarize(&posterior::predict(&model, &guide, data.x(), 100, 11)?.obs, lq, uq)?;
    let large = summarize(&posterior::predict(&model, &guide, data.x(), 10_000, 11)?.obs, lq, uq)?;

    let avg = |v: &[f32]| v.iter().sum::<f32>() / v.len() as f32;
    let ratio = avg(&small.std_error) / avg(&large.std_error);
    println!("std error ratio, 100 vs 10000 draws: {:.3}", ratio);
    // sqrt(10_000 / 100) = 10
    assert!((7.0..13.0).contains(&ratio), "ratio = {}", ratio);
    Ok(())
}

#[test]
fn same_seed_same_fit_and_bundle() -> Result<()> {
    let data = simulate_linear(&SimArgs::default(), &mut StdRng::seed_from_u64(2))?;
    let model = GenerativeModel::default();

    let mut config = SviConfig::default();
    config.train.num_epochs = 300;

    let run = |seed: u64| -> Result<(Vec<f32>, Mat)> {
        let mut rng = StdRng::seed_from_u64(seed);
        let (guide, trace) = svi::fit(&data, model.clone(), config.clone(), &mut rng)?;
        let bundle = PosteriorSampler::new(&model, &guide).predict(data.x(), 500, seed)?;
        Ok((trace.losses, bundle.obs))
    };

    let (losses_a, obs_a) = run(3)?;
    let (losses_b, obs_b) = run(3)?;
    assert_eq!(losses_a, losses_b);
    assert_eq!(obs_a, obs_b);
    Ok(())
}

#[test]
fn mismatched_lengths_are_rejected() {
    let res = Dataset::new(vec![0.0, 1.0, 2.0], vec![1.0, 3.0]);
    assert!(matches!(res, Err(LentilError::InvalidInput(_))));
}

#[test]
fn single_point_fits_stay_finite() -> Result<()> {
    let data = Dataset::new(vec![0.5], vec![2.0])?;

    let mut config = SviConfig::default();
    config.train.num_epochs = 200;
    let (guide, trace) = svi::fit(&data, GenerativeModel::default(), config, &mut StdRng::seed_from_u64(4))?;

    assert!(trace.per_point().iter().all(|l| l.is_finite()));
    let median = guide.median()?;
    assert!(median.weight.is_finite() && median.bias.is_finite());
    assert!(median.sigma > 0.0 && median.sigma < 5.0);
    Ok(())
}
