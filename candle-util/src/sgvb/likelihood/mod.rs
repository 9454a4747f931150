//! Likelihood functions for SGVB inference.

mod gaussian;

pub use gaussian::GaussianLikelihood;
