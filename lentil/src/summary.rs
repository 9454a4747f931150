use crate::common::*;
use crate::model::Latent;
use crate::posterior::PredictiveBundle;

use ndarray::parallel::prelude::*;
use ndarray::{ArrayView1, Axis};

/// Per-point mean and quantile band of a sample matrix
///
/// `lower` and `upper` are the `lower_q` and `upper_q` sample quantiles,
/// except where the mean falls outside them: the band is then widened to
/// reach the mean, so `lower <= mean <= upper` holds at every point.
#[derive(Debug, Clone)]
pub struct SummaryBand {
    pub mean: Vec<f32>,
    pub lower: Vec<f32>,
    pub upper: Vec<f32>,
    /// Monte Carlo standard error of `mean`: sd / sqrt(S)
    pub std_error: Vec<f32>,
    pub lower_q: f32,
    pub upper_q: f32,
}

impl SummaryBand {
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    pub fn contains(&self, i: usize, value: f32) -> bool {
        self.lower[i] <= value && value <= self.upper[i]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LatentSummary {
    pub latent: Latent,
    pub mean: f32,
    pub sd: f32,
    pub lower: f32,
    pub upper: f32,
}

struct ColumnStat {
    mean: f32,
    sd: f32,
    lower: f32,
    upper: f32,
}

fn check_quantiles(lower_q: f32, upper_q: f32) -> Result<()> {
    let in_unit = |q: f32| (0.0..=1.0).contains(&q);
    if !in_unit(lower_q) || !in_unit(upper_q) {
        return Err(LentilError::configuration(format!(
            "quantile levels must lie in [0, 1]: ({}, {})",
            lower_q, upper_q
        )));
    }
    if lower_q > upper_q {
        return Err(LentilError::configuration(format!(
            "lower quantile {} exceeds upper quantile {}",
            lower_q, upper_q
        )));
    }
    if (lower_q + upper_q - 1.0).abs() > 1e-5 {
        return Err(LentilError::configuration(format!(
            "quantile levels must be symmetric about 0.5: ({}, {})",
            lower_q, upper_q
        )));
    }
    Ok(())
}

/// Linear interpolation between order statistics; `sorted` is ascending
fn quantile_sorted(sorted: &[f32], q: f32) -> f32 {
    let n = sorted.len();
    let idx = (q * (n - 1) as f32).clamp(0.0, (n - 1) as f32);
    let lo = idx.floor() as usize;
    let hi = idx.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = idx - lo as f32;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

fn column_stat(col: ArrayView1<f32>, lower_q: f32, upper_q: f32) -> ColumnStat {
    let n = col.len() as f32;
    let mean = col.sum() / n;
    let sd = if col.len() > 1 {
        (col.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / (n - 1.0)).sqrt()
    } else {
        0.0
    };

    let mut sorted = col.to_vec();
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));

    // a skewed sample can put the mean outside the quantile interval
    let lower = quantile_sorted(&sorted, lower_q).min(mean);
    let upper = quantile_sorted(&sorted, upper_q).max(mean);

    ColumnStat {
        mean,
        sd,
        lower,
        upper,
    }
}

fn column_stats(samples: &Mat, lower_q: f32, upper_q: f32) -> Result<Vec<ColumnStat>> {
    check_quantiles(lower_q, upper_q)?;
    if samples.nrows() == 0 || samples.ncols() == 0 {
        return Err(LentilError::invalid_input(format!(
            "cannot summarize an empty {} x {} sample matrix",
            samples.nrows(),
            samples.ncols()
        )));
    }
    if samples.iter().any(|v| !v.is_finite()) {
        return Err(LentilError::numerical("non-finite value in sample matrix"));
    }

    Ok(samples
        .axis_iter(Axis(1))
        .into_par_iter()
        .map(|col| column_stat(col, lower_q, upper_q))
        .collect())
}

/// Summarize an S x N sample matrix column by column.
///
/// * `samples` - draws in rows, input points in columns
/// * `lower_q`, `upper_q` - quantile levels, symmetric about 0.5
pub fn summarize(samples: &Mat, lower_q: f32, upper_q: f32) -> Result<SummaryBand> {
    let stats = column_stats(samples, lower_q, upper_q)?;
    let root_s = (samples.nrows() as f32).sqrt();

    Ok(SummaryBand {
        mean: stats.iter().map(|s| s.mean).collect(),
        lower: stats.iter().map(|s| s.lower).collect(),
        upper: stats.iter().map(|s| s.upper).collect(),
        std_error: stats.iter().map(|s| s.sd / root_s).collect(),
        lower_q,
        upper_q,
    })
}

/// Posterior mean, sd and quantiles of `w`, `b` and `σ`
pub fn summarize_latents(
    bundle: &PredictiveBundle,
    lower_q: f32,
    upper_q: f32,
) -> Result<Vec<LatentSummary>> {
    let stats = column_stats(&bundle.latents, lower_q, upper_q)?;
    Ok(Latent::ALL
        .iter()
        .zip(stats)
        .map(|(&latent, s)| LatentSummary {
            latent,
            mean: s.mean,
            sd: s.sd,
            lower: s.lower,
            upper: s.upper,
        })
        .collect())
}

/// Fraction of `y` inside the band, point by point
pub fn coverage(band: &SummaryBand, y: &[f32]) -> Result<f32> {
    if y.len() != band.len() {
        return Err(LentilError::invalid_input(format!(
            "band has {} points but {} values were given",
            band.len(),
            y.len()
        )));
    }
    if y.is_empty() {
        return Err(LentilError::invalid_input("no values to cover"));
    }
    let inside = y
        .iter()
        .enumerate()
        .filter(|&(i, &v)| band.contains(i, v))
        .count();
    Ok(inside as f32 / y.len() as f32)
}
