//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - installs logging
//! - ingests the CSV inputs
//! - replays them into the writer, pausing between batches

use chrono::TimeDelta;
use clap::Parser;
use tracing::info;

use crate::cli::{Cli, Prompt};
use crate::domain::{Fallback, FeederConfig};
use crate::error::AppError;
use crate::feed::{HttpWriter, MockClock, NoClock, ReplayClock};
use crate::reader::Reader;

pub mod replay;

/// Entry point for the `feeder` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    crate::logging::init(cli.log_level, cli.log_format);

    let config = feeder_config_from_args(&cli)?;
    let reader = Reader::from_config(&config)?;

    let mut writer = HttpWriter::from_config(&config);
    let mut clock: Box<dyn ReplayClock> = match &config.mocktime_address {
        Some(address) => Box::new(MockClock::new(address)),
        None => Box::new(NoClock),
    };
    let mut prompt = Prompt::stdio();

    let summary = replay::run_replay(&reader, &config, &mut writer, clock.as_mut(), &mut prompt)?;
    info!(
        steps = summary.steps,
        weather_sent = summary.weather_sent,
        production_missing = summary.production_missing,
        weather_missing = summary.weather_missing,
        "completed"
    );
    Ok(())
}

/// Validate parsed arguments into a run configuration.
pub fn feeder_config_from_args(args: &Cli) -> Result<FeederConfig, AppError> {
    let step_size = TimeDelta::from_std(args.step_size)
        .ok()
        .filter(|d| *d > TimeDelta::zero())
        .ok_or_else(|| {
            AppError::new(
                2,
                format!("--step-size must be positive (got {:?})", args.step_size),
            )
        })?;

    if args.step_amount == 0 {
        return Err(AppError::new(2, "--steps must be at least 1"));
    }

    Ok(FeederConfig {
        weather_path: args.weather_path.clone(),
        production_path: args.production_path.clone(),
        step_size,
        step_amount: args.step_amount,
        batch_size: args.batch_size,
        start_time: args.start_time,
        fallback: Fallback {
            older_timestamp: !args.no_older_fallback,
            more_recent_forecast: !args.no_recent_forecast_fallback,
        },
        address: args.address.clone(),
        mocktime_address: (!args.no_mocktime).then(|| args.mocktime_address.clone()),
        retry_delay: args.retry_delay,
        log_level: args.log_level,
        log_format: args.log_format,
    })
}
