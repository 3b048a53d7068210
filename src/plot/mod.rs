//! Chart rendering to image files.

pub mod chart;

pub use chart::*;
