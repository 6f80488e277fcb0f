//! Quantization of timestamps onto the step grid.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{trace, warn};

use crate::domain::TimeStep;
use crate::error::{FeedError, Result};

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Rounds timestamps to the nearest multiple of a fixed step since the Unix
/// epoch (ties round up).
///
/// Ingestion and lookups must share one rounder so that both sides agree on
/// the key of every value.
#[derive(Debug, Clone, Copy)]
pub struct TimeRounder {
    step: TimeDelta,
    step_nanos: i128,
}

impl TimeRounder {
    pub fn new(step: TimeDelta) -> Result<Self> {
        if step <= TimeDelta::zero() {
            return Err(FeedError::InvalidStep(format!(
                "step must be positive, got {step}"
            )));
        }
        Ok(Self {
            step,
            step_nanos: to_nanos(step.num_seconds(), step.subsec_nanos()),
        })
    }

    pub fn step(&self) -> TimeDelta {
        self.step
    }

    pub fn round(&self, t: DateTime<Utc>) -> TimeStep {
        let nanos = to_nanos(t.timestamp(), t.timestamp_subsec_nanos());
        // floor(nanos / step + 1/2), exact for odd step lengths
        let rounded =
            (2 * nanos + self.step_nanos).div_euclid(2 * self.step_nanos) * self.step_nanos;

        let secs = i64::try_from(rounded.div_euclid(NANOS_PER_SEC)).ok();
        let subsec = rounded.rem_euclid(NANOS_PER_SEC) as u32;
        let Some(rounded) = secs.and_then(|secs| DateTime::from_timestamp(secs, subsec)) else {
            // rounding up past the last representable instant
            warn!(actual = %t, "timestamp cannot be rounded, using it as-is");
            return t;
        };
        if rounded != t {
            trace!(actual = %t, rounded = %rounded, "rounded input timestamp");
        }
        rounded
    }
}

fn to_nanos(secs: i64, subsec: impl Into<i64>) -> i128 {
    i128::from(secs) * NANOS_PER_SEC + i128::from(subsec.into())
}
