//! Mathematical utilities: dense least squares for the damped step.

pub mod lstsq;

pub use lstsq::*;
