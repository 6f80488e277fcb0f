//! Outbound side of the replay: where aligned values are delivered and which
//! clock is moved along with them.
//!
//! - HTTP delivery to the forecasting service (`writer`)
//! - mock-time notifications (`mocktime`)

use chrono::{DateTime, Utc};

use crate::domain::{ProductionData, WeatherData};
use crate::error::Result;

pub mod mocktime;
pub mod writer;

pub use mocktime::*;
pub use writer::*;

/// Receives replayed values. Absent values are delivered as `None`.
pub trait FeedSink {
    fn production(&mut self, time: DateTime<Utc>, data: Option<&ProductionData>) -> Result<()>;
    fn weather(&mut self, time: DateTime<Utc>, data: Option<&WeatherData>) -> Result<()>;
}

/// A clock that follows the replay, notified before each step is delivered.
pub trait ReplayClock {
    fn update(&mut self, time: DateTime<Utc>) -> Result<()>;
}

/// Clock used when mock-time updates are disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoClock;

impl ReplayClock for NoClock {
    fn update(&mut self, _time: DateTime<Utc>) -> Result<()> {
        Ok(())
    }
}
