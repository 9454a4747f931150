use candle_core::{Result, Tensor};

use super::traits::ElboSample;

/// Per-particle ELBO terms: log p(y, θ) - log q(θ), shape (S,)
pub fn elbo_terms(sample: &ElboSample) -> Result<Tensor> {
    &sample.log_joint - &sample.log_q
}

/// Compute the raw ELBO (for monitoring, not for gradients).
///
/// ELBO = E_q[log p(y, θ) - log q(θ)]
///
/// # Returns
/// Mean ELBO estimate over particles (scalar), detached from the graph
pub fn compute_elbo(sample: &ElboSample) -> Result<Tensor> {
    Ok(elbo_terms(sample)?.mean(0)?.detach())
}

/// Compute direct ELBO loss with reparameterization gradients.
///
/// The draws inside `sample` must be differentiable functions of the
/// variational parameters (θ = μ + σ * ε), so gradients flow through
/// both the log joint and log q.
///
/// # Returns
/// Negative ELBO (scalar) - minimize this to maximize ELBO
pub fn direct_elbo_loss(sample: &ElboSample) -> Result<Tensor> {
    elbo_terms(sample)?.mean(0)?.neg()
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device, Tensor, Var};

    #[test]
    fn test_loss_is_negative_mean_elbo() -> Result<()> {
        let device = Device::Cpu;
        let sample = ElboSample {
            log_joint: Tensor::new(&[-10.0f32, -12.0], &device)?,
            log_q: Tensor::new(&[-1.0f32, -3.0], &device)?,
        };

        let loss = direct_elbo_loss(&sample)?;
        assert!(loss.dims().is_empty());
        assert!((loss.to_scalar::<f32>()? - 9.0).abs() < 1e-6);
        assert!((compute_elbo(&sample)?.to_scalar::<f32>()? + 9.0).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_loss_gradient_reaches_parameters() -> Result<()> {
        let device = Device::Cpu;
        let mu = Var::zeros(2, DType::F32, &device)?;

        // log joint = -0.5 * |mu - 1|^2, log q constant
        let log_joint = (mu.as_tensor().affine(1.0, -1.0)?.sqr()?.sum_all()? * (-0.5))?
            .unsqueeze(0)?;
        let sample = ElboSample {
            log_q: Tensor::zeros(1, DType::F32, &device)?,
            log_joint,
        };

        let grads = direct_elbo_loss(&sample)?.backward()?;
        let grad_mu = grads.get(&mu).expect("gradient for mu").to_vec1::<f32>()?;
        assert_eq!(grad_mu, vec![-1.0, -1.0]);
        Ok(())
    }
}
