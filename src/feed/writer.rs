//! HTTP delivery of production and weather values.
//!
//! Each value is POSTed as JSON to `/v1/input/{production|weather}/<unix>/`.
//! The server answers `226 IM Used` while it is still busy with earlier input;
//! the same request is then repeated after a short pause.

use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, trace};

use crate::domain::{FeederConfig, ProductionData, Record, WeatherData};
use crate::error::{FeedError, Result};
use crate::feed::FeedSink;

const PRODUCTION_PATH: &str = "/v1/input/production/";
const WEATHER_PATH: &str = "/v1/input/weather/";
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// How a response status is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Accepted,
    /// The server is still processing; send again.
    Retry,
    Rejected,
}

pub fn classify_status(status: StatusCode) -> Delivery {
    match status {
        StatusCode::OK => Delivery::Accepted,
        StatusCode::IM_USED => Delivery::Retry,
        _ => Delivery::Rejected,
    }
}

pub struct HttpWriter {
    client: Client,
    address: String,
    retry_delay: Duration,
}

impl HttpWriter {
    pub fn new(address: &str) -> Self {
        Self {
            client: Client::new(),
            address: address.trim_end_matches('/').to_string(),
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn from_config(config: &FeederConfig) -> Self {
        Self::new(&config.address).with_retry_delay(config.retry_delay)
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn production_url(&self, time: DateTime<Utc>) -> String {
        format!("{}{PRODUCTION_PATH}{}/", self.address, time.timestamp())
    }

    pub fn weather_url(&self, time: DateTime<Utc>) -> String {
        format!("{}{WEATHER_PATH}{}/", self.address, time.timestamp())
    }

    pub fn write_production(
        &self,
        time: DateTime<Utc>,
        data: Option<&ProductionData>,
    ) -> Result<()> {
        self.post("production", &self.production_url(time), time, data)
    }

    pub fn write_weather(&self, time: DateTime<Utc>, data: Option<&WeatherData>) -> Result<()> {
        self.post("weather", &self.weather_url(time), time, data)
    }

    fn post(
        &self,
        kind: &'static str,
        url: &str,
        time: DateTime<Utc>,
        data: Option<&Record>,
    ) -> Result<()> {
        let body = serde_json::to_vec(&data)?;

        loop {
            trace!(kind, date = %time, ?data, "trying to send data...");
            let resp = self
                .client
                .post(url)
                .header(CONTENT_TYPE, "application/json")
                .body(body.clone())
                .send()
                .map_err(|source| FeedError::Http {
                    url: url.to_string(),
                    source,
                })?;

            match classify_status(resp.status()) {
                Delivery::Accepted => {
                    debug!(kind, date = %time, "successfully sent data");
                    return Ok(());
                }
                Delivery::Retry => {
                    trace!(
                        kind,
                        date = %time,
                        delay = ?self.retry_delay,
                        "server still processing, retrying"
                    );
                    thread::sleep(self.retry_delay);
                }
                Delivery::Rejected => {
                    return Err(FeedError::UnexpectedStatus {
                        url: url.to_string(),
                        status: resp.status(),
                    });
                }
            }
        }
    }
}

impl std::fmt::Debug for HttpWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpWriter")
            .field("address", &self.address)
            .field("retry_delay", &self.retry_delay)
            .finish()
    }
}

impl FeedSink for HttpWriter {
    fn production(&mut self, time: DateTime<Utc>, data: Option<&ProductionData>) -> Result<()> {
        self.write_production(time, data)
    }

    fn weather(&mut self, time: DateTime<Utc>, data: Option<&WeatherData>) -> Result<()> {
        self.write_weather(time, data)
    }
}
