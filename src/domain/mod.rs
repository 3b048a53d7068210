//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the calibration row (`ReferencePoint`) and the fitted series (`Series`)
//! - logistic parameters and their box constraints (`LogisticParams`, `ParamBounds`)
//! - fit outputs (`LogisticFit`, `FitPair`, `CurveSample`) and the JSON export schema

pub mod types;

pub use types::*;
