//! In-memory replay source.
//!
//! A `Reader` owns the ingested production and weather series together with
//! the rounder they were keyed with and the forecast points to deliver. It is
//! built once and only read afterwards:
//!
//! - `lookup` resolves single values with the backfill rules
//! - `iterator` walks the replay window step by step

use std::collections::BTreeMap;
use std::path::Path;

use chrono::TimeDelta;
use tracing::{debug, info};

use crate::domain::{FeederConfig, Horizon, ProductionData, Series, TimeStep, WeatherData};
use crate::error::Result;
use crate::io::{ProductionInput, WeatherInput, read_production_input, read_weather_input};
use crate::timestep::TimeRounder;

pub mod iterator;
pub mod lookup;
pub mod plan;

pub use iterator::*;
pub use plan::*;

#[derive(Debug, Clone)]
pub struct Reader {
    round: TimeRounder,
    production: Series<ProductionData>,
    weather: BTreeMap<Horizon, Series<WeatherData>>,
    forecast_points: Vec<Horizon>,
}

impl Reader {
    /// Ingest all input files. Any ingestion error is returned as-is; partial
    /// input is never used.
    pub fn new(
        weather_path: &Path,
        production_path: &Path,
        step: TimeDelta,
        step_amount: u32,
    ) -> Result<Self> {
        info!(
            weather_path = %weather_path.display(),
            production_path = %production_path.display(),
            step = %step,
            step_amount,
            "creating new reader..."
        );
        let round = TimeRounder::new(step)?;
        let weather = read_weather_input(weather_path, &round)?;
        let production = read_production_input(production_path, &round)?;
        Self::from_inputs(production, weather, round, step_amount)
    }

    pub fn from_config(config: &FeederConfig) -> Result<Self> {
        Self::new(
            &config.weather_path,
            &config.production_path,
            config.step_size,
            config.step_amount,
        )
    }

    pub fn from_inputs(
        production: ProductionInput,
        weather: WeatherInput,
        round: TimeRounder,
        step_amount: u32,
    ) -> Result<Self> {
        Self::from_series(production.series, weather.horizons, round, step_amount)
    }

    /// Build a reader from already keyed series.
    ///
    /// The series must have been keyed with `round`.
    pub fn from_series(
        production: Series<ProductionData>,
        weather: BTreeMap<Horizon, Series<WeatherData>>,
        round: TimeRounder,
        step_amount: u32,
    ) -> Result<Self> {
        let forecast_points = plan_forecast_points(round.step(), step_amount)?;
        info!(amount_forecast_points = forecast_points.len(), "forecast points planned");
        for point in &forecast_points {
            debug!(forecast_point = %point, backed = weather.contains_key(point));
        }

        Ok(Self {
            round,
            production,
            weather,
            forecast_points,
        })
    }

    pub fn step(&self) -> TimeDelta {
        self.round.step()
    }

    pub fn round(&self, t: TimeStep) -> TimeStep {
        self.round.round(t)
    }

    pub fn forecast_points(&self) -> &[Horizon] {
        &self.forecast_points
    }

    pub fn production(&self) -> &Series<ProductionData> {
        &self.production
    }
}
