//! Calibration data for the fall-risk curves.

pub mod reference;

pub use reference::*;
