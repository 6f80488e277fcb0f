//! Production input: a single CSV file, first write wins.

use std::path::Path;

use tracing::{info, warn};

use crate::domain::{InsertOutcome, ProductionData, Series, WritePolicy};
use crate::error::Result;
use crate::io::ingest::{TimedRecord, read_timed_records};
use crate::timestep::TimeRounder;

/// Ingested production series plus bookkeeping for the run summary.
#[derive(Debug, Clone)]
pub struct ProductionInput {
    pub series: Series<ProductionData>,
    pub rows_read: usize,
    /// Rows dropped because their time step was already populated.
    pub collisions: usize,
}

/// Read the production CSV at `path`.
///
/// An empty result is not an error (the replay will simply be empty), but is
/// logged as a warning.
pub fn read_production_input(path: &Path, round: &TimeRounder) -> Result<ProductionInput> {
    info!(path = %path.display(), "reading production data...");
    let rows = read_timed_records(path)?;
    let input = build_production_series(rows, round);

    if input.series.is_empty() {
        warn!(path = %path.display(), "no production data found");
    } else {
        info!(
            amount = input.series.len(),
            collisions = input.collisions,
            "production-processing complete"
        );
    }
    Ok(input)
}

pub(crate) fn build_production_series(
    rows: Vec<TimedRecord>,
    round: &TimeRounder,
) -> ProductionInput {
    let rows_read = rows.len();
    let mut series = Series::new(WritePolicy::FirstWins);
    let mut collisions = 0usize;

    for row in rows {
        let step = round.round(row.time);
        if series.insert(step, row.record) == InsertOutcome::Rejected {
            collisions += 1;
            warn!(timestep = %step, line = row.line, "conflicting production input");
        }
    }

    ProductionInput {
        series,
        rows_read,
        collisions,
    }
}
