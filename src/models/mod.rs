//! Logistic model implementation.
//!
//! Evaluation is kept in small, pure functions so the fitter, the sampler and
//! the renderers can share them.

pub mod logistic;
pub mod sampler;

pub use logistic::*;
pub use sampler::*;
