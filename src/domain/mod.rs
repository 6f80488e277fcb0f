//! Domain types used throughout the feeder.
//!
//! This module defines:
//!
//! - time keys and forecast horizons (`TimeStep`, `Horizon`)
//! - opaque value records read from CSV (`Record`)
//! - time-indexed series with write policies (`Series`)
//! - iteration outputs and run configuration (`AlignedStep`, `FeederConfig`)

pub mod series;
pub mod types;

pub use series::*;
pub use types::*;
