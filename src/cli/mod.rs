//! Command-line parsing for the CSV replay feeder.
//!
//! Every flag can also be given through a `FEEDER_*` environment variable;
//! `app::run` loads a `.env` file before parsing so both sources work the same.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::Parser;

use crate::domain::{LogFormat, LogLevel};
use crate::io::parse_timestamp;

pub mod pause;

pub use pause::*;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "feeder",
    version,
    about = "Replays production and weather CSV files into the forecasting service"
)]
pub struct Cli {
    /// Directory searched (recursively) for `forecast_<N>{h|d}_ahead.csv` files.
    #[arg(short = 'w', long, env = "FEEDER_WEATHER_PATH", default_value = ".")]
    pub weather_path: PathBuf,

    /// Production CSV file.
    #[arg(short = 'p', long, env = "FEEDER_PRODUCTION_PATH", default_value = ".")]
    pub production_path: PathBuf,

    /// Duration of one model step, e.g. `1h`, `15m`, `1h30m`.
    #[arg(long, env = "FEEDER_STEP_SIZE", default_value = "1h", value_parser = parse_duration)]
    pub step_size: Duration,

    /// Number of steps the model looks ahead.
    #[arg(long = "steps", env = "FEEDER_STEPS", default_value_t = 120)]
    pub step_amount: u32,

    /// Hours per batch; the replay pauses before each batch (0 never pauses).
    #[arg(short = 'b', long, env = "FEEDER_BATCH_SIZE", default_value_t = 24)]
    pub batch_size: u32,

    /// Start of the replay, as Unix seconds or RFC 3339. Never moves the start earlier.
    #[arg(short = 's', long, env = "FEEDER_START_TIME", value_parser = parse_start_time)]
    pub start_time: Option<DateTime<Utc>>,

    /// Base address of the input endpoints.
    #[arg(short = 'a', long, env = "FEEDER_ADDRESS", default_value = "http://localhost:8080")]
    pub address: String,

    /// Base address of the mock-time endpoint.
    #[arg(
        short = 'm',
        long,
        env = "FEEDER_MOCKTIME_ADDRESS",
        default_value = "http://localhost:8090"
    )]
    pub mocktime_address: String,

    /// Do not update the mock clock.
    #[arg(long, env = "FEEDER_NO_MOCKTIME")]
    pub no_mocktime: bool,

    /// Do not substitute the nearest earlier value for a missing one.
    #[arg(long, env = "FEEDER_NO_OLDER_FALLBACK")]
    pub no_older_fallback: bool,

    /// Do not substitute a shorter-horizon forecast for a missing one.
    #[arg(long, env = "FEEDER_NO_RECENT_FORECAST_FALLBACK")]
    pub no_recent_forecast_fallback: bool,

    /// Pause before resending while the server is still processing.
    #[arg(long, env = "FEEDER_RETRY_DELAY", default_value = "1s", value_parser = parse_duration)]
    pub retry_delay: Duration,

    #[arg(
        short = 'l',
        long,
        env = "FEEDER_LOG_LEVEL",
        value_enum,
        default_value_t = LogLevel::Info
    )]
    pub log_level: LogLevel,

    #[arg(long, env = "FEEDER_LOG_FORMAT", value_enum, default_value_t = LogFormat::Tty)]
    pub log_format: LogFormat,
}

/// Parse a duration such as `90s`, `15m`, `1h30m` or `2d`.
///
/// Units: `ms`, `s`, `m`, `h`, `d`. A bare `0` is accepted.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err("empty duration".to_string());
    }

    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return Err(format!("invalid duration '{s}': expected a number"));
        }
        let value: u64 = rest[..digits]
            .parse()
            .map_err(|e| format!("invalid duration '{s}': {e}"))?;
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let part = match &rest[..unit_len] {
            "ms" => Some(Duration::from_millis(value)),
            "s" => Some(Duration::from_secs(value)),
            "m" => value.checked_mul(60).map(Duration::from_secs),
            "h" => value.checked_mul(3_600).map(Duration::from_secs),
            "d" => value.checked_mul(86_400).map(Duration::from_secs),
            "" => return Err(format!("invalid duration '{s}': missing unit")),
            unit => return Err(format!("invalid duration '{s}': unknown unit '{unit}'")),
        };
        rest = &rest[unit_len..];

        total = part
            .and_then(|p| total.checked_add(p))
            .ok_or_else(|| format!("invalid duration '{s}': too large"))?;
    }
    Ok(total)
}

pub fn parse_start_time(s: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(s)
        .ok_or_else(|| format!("invalid start time '{s}': expected Unix seconds or RFC 3339"))
}
