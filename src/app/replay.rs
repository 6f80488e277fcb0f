//! The replay loop shared by the binary and the integration tests.
//!
//! Per time step, in order:
//! 1) move the clock to the step
//! 2) let the batch gate pause if a new batch starts
//! 3) deliver production for the step
//! 4) deliver one weather value per forecast point, keyed by its target time

use std::io::{BufRead, Write};

use tracing::{debug, info};

use crate::cli::{BatchGate, Prompt};
use crate::domain::FeederConfig;
use crate::error::Result;
use crate::feed::{FeedSink, ReplayClock};
use crate::reader::Reader;

/// Counts of what a replay delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub steps: usize,
    pub production_missing: usize,
    pub weather_sent: usize,
    pub weather_missing: usize,
    pub pauses: usize,
}

/// Replay the whole window. The first delivery error stops the replay.
pub fn run_replay<S, C, R, W>(
    reader: &Reader,
    config: &FeederConfig,
    sink: &mut S,
    clock: &mut C,
    prompt: &mut Prompt<R, W>,
) -> Result<ReplaySummary>
where
    S: FeedSink + ?Sized,
    C: ReplayClock + ?Sized,
    R: BufRead,
    W: Write,
{
    let iter = reader.iter_with(config.start_time, config.fallback);
    match iter.window() {
        Some(window) => info!(start = %window.start, end = %window.end, "replaying"),
        None => info!("nothing to replay"),
    }

    let mut gate = BatchGate::new(config.batch_size);
    let mut summary = ReplaySummary::default();

    for step in iter {
        clock.update(step.time)?;
        info!(date = %step.time, "updated mocktime");

        if gate.step(step.time, prompt) {
            summary.pauses += 1;
        }

        if step.production.is_none() {
            summary.production_missing += 1;
            debug!(date = %step.time, "no production value");
        }
        sink.production(step.time, step.production)?;

        for slot in &step.weather {
            if slot.value.is_none() {
                summary.weather_missing += 1;
                debug!(date = %step.time, horizon = %slot.horizon, "no weather value");
            }
            sink.weather(slot.target, slot.value)?;
            summary.weather_sent += 1;
        }
        summary.steps += 1;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::time::Duration;

    use chrono::{DateTime, TimeDelta, TimeZone, Utc};

    use super::*;
    use crate::domain::{
        Fallback, Horizon, LogFormat, LogLevel, ProductionData, Record, Series, WeatherData,
        WritePolicy,
    };
    use crate::error::FeedError;
    use crate::timestep::TimeRounder;

    fn hour(h: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap() + TimeDelta::hours(h)
    }

    fn series(hours: &[i64]) -> Series<Record> {
        let mut s = Series::new(WritePolicy::FirstWins);
        for &h in hours {
            let mut r = Record::new();
            r.insert_cell("v", &h.to_string());
            s.insert(hour(h), r);
        }
        s
    }

    fn config(batch_size: u32) -> FeederConfig {
        FeederConfig {
            weather_path: PathBuf::from("."),
            production_path: PathBuf::from("."),
            step_size: TimeDelta::hours(1),
            step_amount: 2,
            batch_size,
            start_time: None,
            fallback: Fallback::default(),
            address: "http://localhost:8080".to_string(),
            mocktime_address: None,
            retry_delay: Duration::ZERO,
            log_level: LogLevel::Info,
            log_format: LogFormat::Logfmt,
        }
    }

    fn reader() -> Reader {
        let round = TimeRounder::new(TimeDelta::hours(1)).unwrap();
        let weather = BTreeMap::from([
            (Horizon::ZERO, series(&[0, 1, 2, 3])),
            (Horizon::from_hours(1), series(&[1, 2, 3])),
        ]);
        Reader::from_series(series(&[0, 1, 3]), weather, round, 2).unwrap()
    }

    #[derive(Debug, Default)]
    struct Recorder {
        events: Vec<String>,
        fail_production_at: Option<DateTime<Utc>>,
    }

    fn show(data: Option<&Record>) -> String {
        data.and_then(|r| r.get_f64("v"))
            .map_or("-".to_string(), |v| v.to_string())
    }

    impl FeedSink for Recorder {
        fn production(&mut self, time: DateTime<Utc>, data: Option<&ProductionData>) -> Result<()> {
            if self.fail_production_at == Some(time) {
                return Err(FeedError::MockTime("boom".to_string()));
            }
            self.events.push(format!("p {} {}", time.format("%H"), show(data)));
            Ok(())
        }

        fn weather(&mut self, time: DateTime<Utc>, data: Option<&WeatherData>) -> Result<()> {
            self.events.push(format!("w {} {}", time.format("%H"), show(data)));
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct Ticks(Vec<DateTime<Utc>>);

    impl ReplayClock for Ticks {
        fn update(&mut self, time: DateTime<Utc>) -> Result<()> {
            self.0.push(time);
            Ok(())
        }
    }

    #[test]
    fn delivers_steps_in_order() {
        let mut sink = Recorder::default();
        let mut clock = Ticks::default();
        let mut out = Vec::new();
        let mut prompt = Prompt::new(&b""[..], &mut out);

        let summary =
            run_replay(&reader(), &config(0), &mut sink, &mut clock, &mut prompt).unwrap();

        assert_eq!(clock.0, vec![hour(0), hour(1), hour(2), hour(3)]);
        assert_eq!(&sink.events[..6], &[
            "p 00 0", "w 00 0", "w 01 1", // 1h slot at hour 0 targets hour 1
            "p 01 1", "w 01 1", "w 02 2",
        ]);
        // production hour 2 is backfilled from hour 1
        assert_eq!(sink.events[6], "p 02 1");
        assert_eq!(summary.steps, 4);
        assert_eq!(summary.weather_sent, 8);
        assert_eq!(summary.production_missing, 0);
        assert_eq!(summary.pauses, 0);
    }

    #[test]
    fn pauses_before_each_batch() {
        let mut sink = Recorder::default();
        let mut clock = Ticks::default();
        let mut out = Vec::new();
        let mut prompt = Prompt::new(&b"\n\n"[..], &mut out);

        let summary =
            run_replay(&reader(), &config(2), &mut sink, &mut clock, &mut prompt).unwrap();
        assert_eq!(summary.pauses, 2);
    }

    #[test]
    fn delivery_error_stops_the_replay() {
        let mut sink = Recorder {
            fail_production_at: Some(hour(1)),
            ..Recorder::default()
        };
        let mut clock = Ticks::default();
        let mut out = Vec::new();
        let mut prompt = Prompt::new(&b""[..], &mut out);

        let err =
            run_replay(&reader(), &config(0), &mut sink, &mut clock, &mut prompt).unwrap_err();
        assert!(matches!(err, FeedError::MockTime(_)));
        assert_eq!(clock.0, vec![hour(0), hour(1)]);
        assert_eq!(sink.events.len(), 3);
    }
}
