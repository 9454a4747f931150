use candle_core::{Result, Tensor};

/// A bijection from the real line onto the support of a latent.
///
/// `forward` maps unconstrained values u to the constrained domain,
/// `inverse` maps them back, and `log_abs_det_jacobian` is
/// log |d forward(u) / du| evaluated element-wise at u.
pub trait ConstraintTransform {
    fn forward(&self, u: &Tensor) -> Result<Tensor>;

    fn inverse(&self, v: &Tensor) -> Result<Tensor>;

    fn log_abs_det_jacobian(&self, u: &Tensor) -> Result<Tensor>;
}

/// Latents on an open interval: v = low + (high - low) * sigmoid(u)
#[derive(Debug, Clone, Copy)]
pub struct IntervalTransform {
    low: f64,
    high: f64,
}

impl IntervalTransform {
    pub fn new(low: f64, high: f64) -> Self {
        debug_assert!(high > low, "empty interval ({}, {})", low, high);
        Self { low, high }
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    fn width(&self) -> f64 {
        self.high - self.low
    }
}

/// sigmoid(u) = 1 / (1 + exp(-u))
fn sigmoid(u: &Tensor) -> Result<Tensor> {
    (u.neg()?.exp()? + 1.0)?.recip()
}

impl ConstraintTransform for IntervalTransform {
    fn forward(&self, u: &Tensor) -> Result<Tensor> {
        sigmoid(u)?.affine(self.width(), self.low)
    }

    /// u = log(p) - log(1 - p) with p = (v - low) / (high - low)
    fn inverse(&self, v: &Tensor) -> Result<Tensor> {
        let p = v.affine(1.0 / self.width(), -self.low / self.width())?;
        let one_minus_p = p.affine(-1.0, 1.0)?;
        p.log()? - one_minus_p.log()?
    }

    /// log(high - low) + log sigmoid(u) + log sigmoid(-u)
    ///
    /// Written as `log(high - low) - |u| - 2 log(1 + exp(-|u|))`
    /// so that it stays finite for large |u|.
    fn log_abs_det_jacobian(&self, u: &Tensor) -> Result<Tensor> {
        let abs_u = u.abs()?;
        let softplus = (abs_u.neg()?.exp()? + 1.0)?.log()?;
        let log_det = (abs_u + (softplus * 2.0)?)?.neg()?;
        log_det + self.width().ln()
    }
}
