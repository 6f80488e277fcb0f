//! Mock clock of the forecasting service, moved along with the replay.

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use tracing::debug;

use crate::error::{FeedError, Result};
use crate::feed::ReplayClock;

const MOCKTIME_PATH: &str = "/utils/time/mocktime/";

#[derive(Debug, Clone)]
pub struct MockClock {
    client: Client,
    address: String,
}

impl MockClock {
    pub fn new(address: &str) -> Self {
        Self {
            client: Client::new(),
            address: address.trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, time: DateTime<Utc>) -> String {
        format!("{}{MOCKTIME_PATH}{}", self.address, time.timestamp())
    }

    /// Set the server's notion of "now" to `time`. Anything but `200` fails.
    pub fn set(&self, time: DateTime<Utc>) -> Result<()> {
        let url = self.url(time);
        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|err| FeedError::MockTime(format!("{url}: {err}")))?;

        if resp.status() != StatusCode::OK {
            return Err(FeedError::MockTime(format!("{url}: {}", resp.status())));
        }
        debug!(date = %time, "updated mocktime");
        Ok(())
    }
}

impl ReplayClock for MockClock {
    fn update(&mut self, time: DateTime<Utc>) -> Result<()> {
        self.set(time)
    }
}
