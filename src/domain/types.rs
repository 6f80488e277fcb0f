//! Shared domain types.
//!
//! Records are kept opaque: the feeder never interprets production or weather
//! values, it only aligns them in time and forwards them as JSON.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, TimeDelta, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A timestamp that went through `TimeRounder::round`. Key of every series.
pub type TimeStep = DateTime<Utc>;

/// Forecast lead time in whole hours.
///
/// Files named `forecast_<N>d_ahead.csv` are stored as `N * 24` hours, so a
/// daily and an hourly file can end up on the same horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Horizon(u32);

impl Horizon {
    pub const ZERO: Horizon = Horizon(0);

    pub fn from_hours(hours: u32) -> Self {
        Horizon(hours)
    }

    pub fn from_days(days: u32) -> Option<Self> {
        days.checked_mul(24).map(Horizon)
    }

    pub fn hours(self) -> u32 {
        self.0
    }

    pub fn as_delta(self) -> TimeDelta {
        TimeDelta::hours(i64::from(self.0))
    }

    /// The next shorter horizon (one hour less), or `None` at `0h`.
    pub fn shorter(self) -> Option<Horizon> {
        self.0.checked_sub(1).map(Horizon)
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h", self.0)
    }
}

/// One CSV row minus its `Time` column, keyed by the original header names.
///
/// Numeric cells become JSON numbers, empty cells `null`, anything else a
/// string. Serializes as a flat JSON object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw CSV cell, converting it as described on the type.
    pub fn insert_cell(&mut self, column: &str, raw: &str) {
        let raw = raw.trim();
        let value = if raw.is_empty() {
            Value::Null
        } else if let Some(number) = raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .and_then(serde_json::Number::from_f64)
        {
            Value::Number(number)
        } else {
            Value::String(raw.to_string())
        };
        self.fields.insert(column.to_string(), value);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    pub fn get_f64(&self, column: &str) -> Option<f64> {
        self.fields.get(column).and_then(Value::as_f64)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A production measurement (e.g. generated power) for one time step.
pub type ProductionData = Record;

/// A weather forecast (e.g. irradiance, temperature) for one time step.
pub type WeatherData = Record;

/// Which substitutions a lookup may make when the exact value is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fallback {
    /// Walk back to the nearest earlier time step of the same series.
    pub older_timestamp: bool,
    /// Use a shorter horizon's forecast for the same target time.
    pub more_recent_forecast: bool,
}

impl Fallback {
    pub const NONE: Fallback = Fallback {
        older_timestamp: false,
        more_recent_forecast: false,
    };
}

impl Default for Fallback {
    fn default() -> Self {
        Fallback {
            older_timestamp: true,
            more_recent_forecast: true,
        }
    }
}

/// The weather value resolved for one forecast point of a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherSlot<'a> {
    /// Requested lead time (the forecast point).
    pub horizon: Horizon,
    /// Absolute time the forecast is for: step time + horizon.
    pub target: TimeStep,
    pub value: Option<&'a WeatherData>,
}

/// One iteration result: a production value plus one weather slot per
/// forecast point, in forecast-point order.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedStep<'a> {
    pub time: TimeStep,
    pub production: Option<&'a ProductionData>,
    pub weather: Vec<WeatherSlot<'a>>,
}

/// Log verbosity accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, colored.
    Tty,
    /// Plain key=value lines with full timestamps, no colors.
    Logfmt,
    /// One JSON object per event.
    Json,
}

/// A full run's configuration as understood by the replay.
///
/// This is derived from CLI flags (plus `.env` / environment and defaults).
#[derive(Debug, Clone)]
pub struct FeederConfig {
    pub weather_path: PathBuf,
    pub production_path: PathBuf,

    /// Duration of one step of the consuming model.
    pub step_size: TimeDelta,
    /// Number of steps the consuming model looks ahead.
    pub step_amount: u32,

    /// Steps per batch; `0` never pauses.
    pub batch_size: u32,
    pub start_time: Option<DateTime<Utc>>,
    pub fallback: Fallback,

    pub address: String,
    /// `None` disables mock-clock updates.
    pub mocktime_address: Option<String>,
    /// Pause between resends while the server reports "still processing".
    pub retry_delay: std::time::Duration,

    pub log_level: LogLevel,
    pub log_format: LogFormat,
}
