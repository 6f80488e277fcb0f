//! Replay window and step iterator.

use std::iter::FusedIterator;

use chrono::{DateTime, Utc};

use crate::domain::{AlignedStep, Fallback, SeriesBounds, TimeStep};
use crate::reader::Reader;

/// Inclusive range of time steps a replay walks. `start > end` means nothing
/// is replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayWindow {
    pub start: TimeStep,
    pub end: TimeStep,
}

impl Reader {
    /// Compute the replay window, or `None` when production or all weather
    /// series are empty.
    ///
    /// The start is the oldest time step of any series, moved later (never
    /// earlier) by an explicit `start`. The end starts at the latest production
    /// step and is replaced by a horizon's latest step whenever that lies after
    /// the start; horizons are visited in ascending order.
    pub fn replay_window(&self, start: Option<DateTime<Utc>>) -> Option<ReplayWindow> {
        let production = self.production.bounds()?;
        let weather: Vec<SeriesBounds> = self.weather.values().filter_map(|s| s.bounds()).collect();
        if weather.is_empty() {
            return None;
        }

        let mut s = production.oldest;
        for bounds in &weather {
            if s > bounds.oldest {
                s = bounds.oldest;
            }
        }
        if let Some(explicit) = start.map(|t| self.round(t)) {
            if explicit > s {
                s = explicit;
            }
        }

        // Compared against the start, not against the running end.
        let mut end = production.latest;
        for bounds in &weather {
            if s < bounds.latest {
                end = bounds.latest;
            }
        }

        Some(ReplayWindow { start: s, end })
    }

    /// Iterate the replay window with both fallbacks enabled.
    pub fn iter(&self, start: Option<DateTime<Utc>>) -> ReplayIter<'_> {
        self.iter_with(start, Fallback::default())
    }

    pub fn iter_with(&self, start: Option<DateTime<Utc>>, fallback: Fallback) -> ReplayIter<'_> {
        ReplayIter {
            reader: self,
            fallback,
            window: self.replay_window(start),
            curr: None,
        }
    }
}

/// Cursor over a `Reader`, yielding one `AlignedStep` per time step.
#[derive(Debug, Clone)]
pub struct ReplayIter<'a> {
    reader: &'a Reader,
    fallback: Fallback,
    window: Option<ReplayWindow>,
    /// `None` until the first step is taken.
    curr: Option<TimeStep>,
}

impl ReplayIter<'_> {
    pub fn window(&self) -> Option<ReplayWindow> {
        self.window
    }

    fn current(&self) -> Option<TimeStep> {
        let window = self.window?;
        Some(self.curr.unwrap_or(window.start))
    }

    pub fn has_next(&self) -> bool {
        match (self.window, self.current()) {
            (Some(window), Some(curr)) => curr <= window.end,
            _ => false,
        }
    }
}

impl<'a> Iterator for ReplayIter<'a> {
    type Item = AlignedStep<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_next() {
            return None;
        }
        let time = self.current()?;
        let reader = self.reader;

        let production = reader.read_production(time, self.fallback.older_timestamp);
        let weather = reader.read_weather_forecast(time, self.fallback);
        self.curr = Some(time + reader.step());

        Some(AlignedStep {
            time,
            production,
            weather,
        })
    }
}

impl FusedIterator for ReplayIter<'_> {}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{TimeDelta, TimeZone};

    use super::*;
    use crate::domain::{Horizon, Record, Series, WritePolicy};
    use crate::timestep::TimeRounder;

    fn hour(h: i64) -> TimeStep {
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

    fn reader_with_step(
        step: TimeDelta,
        production: &[i64],
        weather: &[(u32, &[i64])],
        step_amount: u32,
    ) -> Reader {
        let round = TimeRounder::new(step).unwrap();
        let weather: BTreeMap<_, _> = weather
            .iter()
            .map(|(h, hours)| (Horizon::from_hours(*h), series(hours)))
            .collect();
        Reader::from_series(series(production), weather, round, step_amount).unwrap()
    }

    fn reader(production: &[i64], weather: &[(u32, &[i64])], step_amount: u32) -> Reader {
        reader_with_step(TimeDelta::hours(1), production, weather, step_amount)
    }

    fn v(r: Option<&Record>) -> Option<f64> {
        r.and_then(|r| r.get_f64("v"))
    }

    #[test]
    fn window_starts_at_oldest_of_any_series() {
        let r = reader(&[3, 4, 5], &[(0, &[1, 2]), (1, &[2, 6])], 1);
        let w = r.replay_window(None).unwrap();
        assert_eq!(w.start, hour(1));
        // 1h latest (6) lies after the start and is visited last
        assert_eq!(w.end, hour(6));
    }

    #[test]
    fn end_follows_last_horizon_after_start() {
        // Ascending horizon order: 0h sets end to 9, then 1h sets it back to 4.
        let r = reader(&[2, 5], &[(0, &[2, 9]), (1, &[3, 4])], 1);
        let w = r.replay_window(None).unwrap();
        assert_eq!(w, ReplayWindow { start: hour(2), end: hour(4) });
    }

    #[test]
    fn explicit_start_only_moves_later() {
        let r = reader(&[2, 3, 4, 5], &[(0, &[2, 5])], 1);
        assert_eq!(r.replay_window(Some(hour(0))).unwrap().start, hour(2));

        let late = hour(3) + TimeDelta::minutes(10);
        assert_eq!(r.replay_window(Some(late)).unwrap().start, hour(3));
    }

    #[test]
    fn empty_inputs_give_empty_iteration() {
        let no_production = reader(&[], &[(0, &[1, 2])], 1);
        assert!(no_production.replay_window(None).is_none());
        assert!(!no_production.iter(None).has_next());
        assert_eq!(no_production.iter(None).count(), 0);

        let no_weather = reader(&[1, 2], &[(0, &[])], 1);
        assert!(no_weather.replay_window(None).is_none());
        assert_eq!(no_weather.iter(None).next(), None);
    }

    #[test]
    fn yields_one_tuple_per_step_in_window() {
        let r = reader(&[0, 10], &[(0, &[0, 10])], 1);
        let w = r.replay_window(None).unwrap();
        let expected = (w.end - w.start).num_hours() + 1;
        let times: Vec<_> = r.iter(None).map(|s| s.time).collect();
        assert_eq!(times.len() as i64, expected);
        assert_eq!(times.first(), Some(&hour(0)));
        assert_eq!(times.last(), Some(&hour(10)));
    }

    #[test]
    fn coarse_steps_count_floor() {
        let r = reader_with_step(TimeDelta::hours(3), &[0, 9], &[(0, &[0, 9])], 1);
        // start 0, end 9, step 3 -> 0, 3, 6, 9
        assert_eq!(r.iter(None).count(), 4);
    }

    #[test]
    fn explicit_start_after_end_yields_nothing() {
        let r = reader(&[0, 2], &[(0, &[0, 2])], 1);
        let mut it = r.iter(Some(hour(5)));
        assert!(!it.has_next());
        assert_eq!(it.next(), None);
    }

    #[test]
    fn exhausted_iterator_stays_exhausted() {
        let r = reader(&[0], &[(0, &[0])], 1);
        let mut it = r.iter(None);
        assert!(it.next().is_some());
        assert!(it.next().is_none());
        assert!(it.next().is_none());
    }

    #[test]
    fn production_gap_is_backfilled() {
        let r = reader(&[0, 1, 3], &[(0, &[0, 1, 2, 3])], 1);
        let values: Vec<_> = r.iter(None).map(|s| v(s.production)).collect();
        assert_eq!(values, vec![Some(0.0), Some(1.0), Some(1.0), Some(3.0)]);

        let strict: Vec<_> = r
            .iter_with(None, Fallback::NONE)
            .map(|s| v(s.production))
            .collect();
        assert_eq!(strict, vec![Some(0.0), Some(1.0), None, Some(3.0)]);
    }

    #[test]
    fn shorter_horizon_fills_missing_slot() {
        // the 1h series starts after the target, so only the 0h series can help
        let r = reader(&[4, 5], &[(0, &[4, 5]), (1, &[6])], 2);
        let step = r.iter(None).next().unwrap();
        assert_eq!(step.time, hour(4));
        assert_eq!(step.weather[1].target, hour(5));
        assert_eq!(v(step.weather[1].value), Some(5.0));
    }
}
