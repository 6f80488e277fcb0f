//! Forecast points: which lead times every step must deliver weather for.

use chrono::TimeDelta;

use crate::domain::Horizon;
use crate::error::{FeedError, Result};

/// Hourly offsets `0h, 1h, …` up to and including `(step_amount - 1) * step_size`.
///
/// Independent of which horizons actually have data; gaps are resolved at
/// lookup time. `step_amount == 0` plans nothing.
pub fn plan_forecast_points(step_size: TimeDelta, step_amount: u32) -> Result<Vec<Horizon>> {
    let Some(last_step) = step_amount.checked_sub(1) else {
        return Ok(Vec::new());
    };
    if step_size < TimeDelta::zero() {
        return Err(FeedError::InvalidStep(format!(
            "step must not be negative, got {step_size}"
        )));
    }

    let max_distance = i32::try_from(last_step)
        .ok()
        .and_then(|n| step_size.checked_mul(n))
        .ok_or_else(|| {
            FeedError::InvalidStep(format!("{step_amount} steps of {step_size} overflow"))
        })?;
    let max_hours = u32::try_from(max_distance.num_hours()).map_err(|_| {
        FeedError::InvalidStep(format!("forecast distance {max_distance} is too large"))
    })?;

    Ok((0..=max_hours).map(Horizon::from_hours).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hourly_steps() {
        let points = plan_forecast_points(TimeDelta::hours(1), 3).unwrap();
        assert_eq!(
            points,
            vec![Horizon::ZERO, Horizon::from_hours(1), Horizon::from_hours(2)]
        );
    }

    #[test]
    fn coarse_steps_are_filled_hourly() {
        let points = plan_forecast_points(TimeDelta::hours(3), 3).unwrap();
        assert_eq!(points.len(), 7);
        assert_eq!(points.last(), Some(&Horizon::from_hours(6)));
        assert!(points.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn sub_hour_steps_floor_to_whole_hours() {
        // 4 * 15min = 1h, 3 * 15min = 45min -> only 0h
        let points = plan_forecast_points(TimeDelta::minutes(15), 4).unwrap();
        assert_eq!(points, vec![Horizon::ZERO]);
    }

    #[test]
    fn single_step_and_zero_steps() {
        assert_eq!(
            plan_forecast_points(TimeDelta::hours(1), 1).unwrap(),
            vec![Horizon::ZERO]
        );
        assert!(plan_forecast_points(TimeDelta::hours(1), 0).unwrap().is_empty());
    }
}
