//! Value lookups with backfill.
//!
//! Two substitutions exist when the exact value is missing:
//!
//! - older timestamp: the nearest earlier value of the same series, never
//!   before the series' oldest time step
//! - more recent forecast: the same target time from a shorter horizon,
//!   stepping down one hour at a time to `0h`
//!
//! A miss after all substitutions is `None`, never an error.

use chrono::{DateTime, Utc};

use crate::domain::{Fallback, Horizon, ProductionData, Series, TimeStep, WeatherData, WeatherSlot};
use crate::reader::Reader;

impl Reader {
    pub fn read_production(
        &self,
        t: DateTime<Utc>,
        older_timestamp: bool,
    ) -> Option<&ProductionData> {
        lookup(&self.production, self.round(t), older_timestamp)
    }

    /// Value of the `horizon` series at `t`.
    pub fn read_weather(
        &self,
        t: DateTime<Utc>,
        horizon: Horizon,
        older_timestamp: bool,
    ) -> Option<&WeatherData> {
        let series = self.weather.get(&horizon)?;
        lookup(series, self.round(t), older_timestamp)
    }

    /// Like `read_weather`, but falls back to shorter horizons for the same
    /// target time when allowed. Returns the value and the horizon it came from.
    pub fn read_weather_substituted(
        &self,
        target: DateTime<Utc>,
        horizon: Horizon,
        fallback: Fallback,
    ) -> Option<(Horizon, &WeatherData)> {
        let mut candidate = Some(horizon);
        while let Some(h) = candidate {
            if let Some(value) = self.read_weather(target, h, fallback.older_timestamp) {
                return Some((h, value));
            }
            if !fallback.more_recent_forecast {
                break;
            }
            candidate = h.shorter();
        }
        None
    }

    /// One weather slot per forecast point for the step at `t`.
    pub fn read_weather_forecast(&self, t: TimeStep, fallback: Fallback) -> Vec<WeatherSlot<'_>> {
        self.forecast_points
            .iter()
            .map(|&horizon| {
                let target = t + horizon.as_delta();
                WeatherSlot {
                    horizon,
                    target,
                    value: self
                        .read_weather_substituted(target, horizon, fallback)
                        .map(|(_, value)| value),
                }
            })
            .collect()
    }
}

fn lookup<T>(series: &Series<T>, step: TimeStep, older_timestamp: bool) -> Option<&T> {
    let bounds = series.bounds()?;
    if step < bounds.oldest {
        return None;
    }
    if let Some(value) = series.get(step) {
        return Some(value);
    }
    if older_timestamp {
        series.at_or_before(step).map(|(_, value)| value)
    } else {
        None
    }
}
