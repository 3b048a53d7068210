//! `fall-risk-curves` library crate.
//!
//! The binary (`fallrisk`) is a thin wrapper around this library so that:
//!
//! - fitting and rendering are testable without spawning processes
//! - the reference table, fitter and chart stay separate, reusable modules

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod tui;
