use crate::common::*;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Paired one-dimensional samples `(x_i, y_i)`
#[derive(Debug, Clone)]
pub struct Dataset {
    x: Vec<f32>,
    y: Vec<f32>,
}

impl Dataset {
    /// Checks that `x` and `y` are non-empty, of equal length and finite.
    /// Never truncates the longer of the two.
    pub fn new(x: Vec<f32>, y: Vec<f32>) -> Result<Self> {
        if x.len() != y.len() {
            return Err(LentilError::invalid_input(format!(
                "x and y differ in length: {} vs {}",
                x.len(),
                y.len()
            )));
        }
        if x.is_empty() {
            return Err(LentilError::invalid_input("empty dataset"));
        }
        check_finite("x", &x)?;
        check_finite("y", &y)?;
        Ok(Self { x, y })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn x(&self) -> &[f32] {
        &self.x
    }

    pub fn y(&self) -> &[f32] {
        &self.y
    }

    /// `(x, y)` as two `(N,)` tensors on `device`
    pub fn to_tensors(&self, device: &Device) -> Result<(Tensor, Tensor)> {
        let n = self.len();
        let x = Tensor::from_slice(&self.x, n, device)?;
        let y = Tensor::from_slice(&self.y, n, device)?;
        Ok((x, y))
    }
}

pub(crate) fn check_finite(name: &str, values: &[f32]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(LentilError::invalid_input(format!(
            "{}[{}] = {} is not finite",
            name, i, values[i]
        ))),
        None => Ok(()),
    }
}

/// `n` evenly spaced points over `[start, end]`
pub fn linspace(start: f32, end: f32, n: usize) -> Vec<f32> {
    match n {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f32;
            (0..n).map(|i| start + step * i as f32).collect()
        }
    }
}

/// Settings for a simulated line `y = weight * x + bias + N(0, noise_sd)`
#[derive(Debug, Clone)]
pub struct SimArgs {
    pub num_points: usize,
    pub weight: f32,
    pub bias: f32,
    pub noise_sd: f32,
}

impl Default for SimArgs {
    fn default() -> Self {
        Self {
            num_points: 100,
            weight: 2.0,
            bias: 1.0,
            noise_sd: 0.2,
        }
    }
}

/// Simulate a noisy line over `x = linspace(0, 1, n)`
///
/// ```text
/// y(i) = w * x(i) + b + e(i),   e(i) ~ N(0, noise_sd²)
/// ```
pub fn simulate_linear<R: Rng + ?Sized>(args: &SimArgs, rng: &mut R) -> Result<Dataset> {
    let x = linspace(0.0, 1.0, args.num_points);
    let y = simulate_response(args, &x, rng)?;
    Dataset::new(x, y)
}

/// Draw fresh responses at given inputs from the same line
pub fn simulate_response<R: Rng + ?Sized>(args: &SimArgs, x: &[f32], rng: &mut R) -> Result<Vec<f32>> {
    if args.noise_sd < 0.0 {
        return Err(LentilError::configuration(format!(
            "noise sd must be non-negative: {}",
            args.noise_sd
        )));
    }

    let line = x.iter().map(|&x_i| args.weight * x_i + args.bias);

    if args.noise_sd == 0.0 {
        return Ok(line.collect());
    }

    let rnorm = Normal::new(0.0f32, args.noise_sd)
        .map_err(|e| LentilError::configuration(e.to_string()))?;
    Ok(line.map(|y_i| y_i + rnorm.sample(&mut *rng)).collect())
}
