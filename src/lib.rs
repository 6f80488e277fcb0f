//! `efs-csv-feeder` library crate.
//!
//! Replays recorded production and weather-forecast CSV files, aligned on a
//! common time grid, into the forecasting service. The binary (`feeder`) is a
//! thin wrapper around this library so that:
//!
//! - the alignment engine (`reader`) is testable without a server
//! - delivery (`feed`) sits behind traits and can be swapped in tests

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod feed;
pub mod io;
pub mod logging;
pub mod reader;
pub mod timestep;
