//! Weather forecast input: one CSV per forecast horizon.
//!
//! Files are discovered recursively below a root directory and must be named
//! `forecast_<N>h_ahead.csv` (hourly resolution) or `forecast_<N>d_ahead.csv`
//! (daily resolution, horizon `N * 24` hours). Other `.csv` files are skipped
//! with a warning; any problem reading a matched file aborts ingestion.

use std::collections::BTreeMap;
use std::fs;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::domain::{Horizon, InsertOutcome, Series, WeatherData, WritePolicy};
use crate::error::{FeedError, Result};
use crate::io::ingest::{TimedRecord, read_timed_records};
use crate::timestep::TimeRounder;

const PREFIX: &str = "forecast_";
const SUFFIX: &str = "_ahead.csv";

/// Time resolution of a forecast file, given by its unit suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// `h` files; later rows refine earlier ones.
    Hourly,
    /// `d` files; the first row per time step is kept.
    Daily,
}

impl Resolution {
    pub fn write_policy(self) -> WritePolicy {
        match self {
            Resolution::Hourly => WritePolicy::LastWins,
            Resolution::Daily => WritePolicy::FirstWins,
        }
    }
}

/// Why a `.csv` file name was not accepted as a forecast file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileNameError {
    #[error("prefix/suffix not matching")]
    PrefixSuffix,
    #[error("illegal duration-unit '{0}'")]
    Unit(char),
    #[error("illegal duration-number: {0}")]
    Number(#[from] ParseIntError),
    #[error("horizon out of range")]
    Overflow,
}

/// A discovered forecast file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastFile {
    pub path: PathBuf,
    pub horizon: Horizon,
    pub resolution: Resolution,
}

/// All weather input, ordered by horizon.
#[derive(Debug, Clone, Default)]
pub struct WeatherInput {
    pub horizons: BTreeMap<Horizon, Series<WeatherData>>,
    /// `.csv` files that did not match the naming pattern.
    pub skipped: Vec<PathBuf>,
}

/// Parse `forecast_<N><h|d>_ahead.csv`.
pub fn parse_forecast_file_name(
    name: &str,
) -> std::result::Result<(Horizon, Resolution), FileNameError> {
    let description = name
        .strip_prefix(PREFIX)
        .and_then(|rest| rest.strip_suffix(SUFFIX))
        .filter(|d| !d.is_empty())
        .ok_or(FileNameError::PrefixSuffix)?;

    let mut chars = description.chars();
    let unit = chars.next_back().ok_or(FileNameError::PrefixSuffix)?;
    let resolution = match unit {
        'h' => Resolution::Hourly,
        'd' => Resolution::Daily,
        other => return Err(FileNameError::Unit(other)),
    };
    let number: u32 = chars.as_str().parse()?;

    let horizon = match resolution {
        Resolution::Hourly => Horizon::from_hours(number),
        Resolution::Daily => Horizon::from_days(number).ok_or(FileNameError::Overflow)?,
    };
    Ok((horizon, resolution))
}

/// Find forecast files below `root`, keyed by horizon.
///
/// Directory entries are visited in lexical order; if two files map to the same
/// horizon the later one wins. Symlinked directories below `root` are not
/// entered.
pub fn discover_forecast_files(
    root: &Path,
) -> Result<(BTreeMap<Horizon, ForecastFile>, Vec<PathBuf>)> {
    let mut candidates = Vec::new();
    collect_csv_files(root, &mut candidates)?;

    let mut files: BTreeMap<Horizon, ForecastFile> = BTreeMap::new();
    let mut skipped = Vec::new();

    for path in candidates {
        let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
        match parse_forecast_file_name(name) {
            Ok((horizon, resolution)) => {
                let file = ForecastFile {
                    path: path.clone(),
                    horizon,
                    resolution,
                };
                if let Some(previous) = files.insert(horizon, file) {
                    warn!(
                        horizon = %horizon,
                        replaced = %previous.path.display(),
                        filepath = %path.display(),
                        "two input-files share a horizon, using the latter"
                    );
                }
            }
            Err(reason) => {
                warn!(
                    filepath = %path.display(),
                    %reason,
                    "possible input-file does not match pattern 'forecast_*(h|d)_ahead.csv', where * is a non-negative integer"
                );
                skipped.push(path);
            }
        }
    }

    Ok((files, skipped))
}

fn walk_err(path: &Path) -> impl Fn(std::io::Error) -> FeedError + '_ {
    move |source| FeedError::Walk {
        path: path.to_path_buf(),
        source,
    }
}

fn collect_csv_files(root: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let metadata = fs::metadata(root).map_err(walk_err(root))?;
    if metadata.is_dir() {
        return walk_dir(root, out);
    }
    trace!(filepath = %root.display(), "found candidate-file");
    if is_csv(root) {
        out.push(root.to_path_buf());
    }
    Ok(())
}

fn walk_dir(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = fs::read_dir(dir)
        .map_err(walk_err(dir))?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(walk_err(dir))?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type().map_err(walk_err(&path))?;

        if file_type.is_dir() {
            walk_dir(&path, out)?;
            continue;
        }
        // a symlink may point back up the tree; only linked files are taken
        if file_type.is_symlink() && path.is_dir() {
            debug!(filepath = %path.display(), "skipping symlinked directory");
            continue;
        }
        trace!(filepath = %path.display(), "found candidate-file");
        if is_csv(&path) {
            out.push(path);
        }
    }
    Ok(())
}

fn is_csv(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .is_some_and(|name| name.ends_with(".csv"))
}

/// Discover and read every forecast file below `root`.
pub fn read_weather_input(root: &Path, round: &TimeRounder) -> Result<WeatherInput> {
    info!(root = %root.display(), "reading weather data...");
    let (files, skipped) = discover_forecast_files(root)?;

    let mut horizons = BTreeMap::new();
    for (horizon, file) in files {
        debug!(
            filepath = %file.path.display(),
            is_hourly = file.resolution == Resolution::Hourly,
            duration_ahead = %horizon,
            "reading next weather-input-file"
        );
        let rows = read_timed_records(&file.path)?;
        let series = build_weather_series(rows, file.resolution, round);
        let bounds = series.bounds();
        debug!(
            filepath = %file.path.display(),
            elements = series.len(),
            oldest = ?bounds.map(|b| b.oldest),
            latest = ?bounds.map(|b| b.latest),
            "file processed"
        );
        horizons.insert(horizon, series);
    }

    info!(
        horizons = horizons.len(),
        skipped = skipped.len(),
        "weather-processing complete"
    );
    Ok(WeatherInput { horizons, skipped })
}

pub(crate) fn build_weather_series(
    rows: Vec<TimedRecord>,
    resolution: Resolution,
    round: &TimeRounder,
) -> Series<WeatherData> {
    let mut series = Series::new(resolution.write_policy());
    for row in rows {
        let step = round.round(row.time);
        match series.insert(step, row.record) {
            InsertOutcome::Inserted => {}
            InsertOutcome::Replaced => {
                trace!(timestep = %step, line = row.line, "hourly row refines earlier value")
            }
            InsertOutcome::Rejected => {
                debug!(timestep = %step, line = row.line, "duplicate daily row ignored")
            }
        }
    }
    series
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone, Utc};
    use tempfile::TempDir;

    use super::*;
    use crate::io::ingest::read_timed_records_from;

    fn hourly() -> TimeRounder {
        TimeRounder::new(TimeDelta::hours(1)).unwrap()
    }

    #[test]
    fn parses_valid_file_names() {
        assert_eq!(
            parse_forecast_file_name("forecast_0h_ahead.csv"),
            Ok((Horizon::ZERO, Resolution::Hourly))
        );
        assert_eq!(
            parse_forecast_file_name("forecast_3d_ahead.csv"),
            Ok((Horizon::from_hours(72), Resolution::Daily))
        );
    }

    #[test]
    fn rejects_malformed_file_names() {
        assert_eq!(
            parse_forecast_file_name("weather_1h_ahead.csv"),
            Err(FileNameError::PrefixSuffix)
        );
        assert_eq!(
            parse_forecast_file_name("forecast_ahead.csv"),
            Err(FileNameError::PrefixSuffix)
        );
        assert_eq!(
            parse_forecast_file_name("forecast_5w_ahead.csv"),
            Err(FileNameError::Unit('w'))
        );
        assert!(matches!(
            parse_forecast_file_name("forecast_xh_ahead.csv"),
            Err(FileNameError::Number(_))
        ));
        assert!(matches!(
            parse_forecast_file_name("forecast_-1h_ahead.csv"),
            Err(FileNameError::Number(_))
        ));
    }

    fn rows() -> Vec<TimedRecord> {
        let csv = "Time,Temp\n\
                   2020-01-01T00:00:00Z,1\n\
                   2020-01-01T00:10:00Z,2\n";
        read_timed_records_from(csv.as_bytes(), Path::new("w.csv")).unwrap()
    }

    #[test]
    fn hourly_files_overwrite_and_daily_files_keep_first() {
        let round = TimeRounder::new(TimeDelta::hours(1)).unwrap();
        let h0 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();

        let hourly = build_weather_series(rows(), Resolution::Hourly, &round);
        assert_eq!(hourly.get(h0).unwrap().get_f64("Temp"), Some(2.0));

        let daily = build_weather_series(rows(), Resolution::Daily, &round);
        assert_eq!(daily.get(h0).unwrap().get_f64("Temp"), Some(1.0));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_loop_is_not_followed() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("forecast_0h_ahead.csv"),
            "Time,Temp\n2020-01-01T00:00:00Z,1\n",
        )
        .unwrap();
        std::os::unix::fs::symlink(".", dir.path().join("loop")).unwrap();

        let input = read_weather_input(dir.path(), &hourly()).unwrap();
        assert_eq!(input.horizons.keys().copied().collect::<Vec<_>>(), vec![Horizon::ZERO]);
        assert_eq!(input.horizons[&Horizon::ZERO].len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_forecast_file_is_read() {
        let data = TempDir::new().unwrap();
        let target = data.path().join("source.csv");
        fs::write(&target, "Time,Temp\n2020-01-01T00:00:00Z,1\n").unwrap();

        let dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink(&target, dir.path().join("forecast_2h_ahead.csv")).unwrap();

        let (files, skipped) = discover_forecast_files(dir.path()).unwrap();
        assert!(skipped.is_empty());
        assert!(files.contains_key(&Horizon::from_hours(2)));
    }

    #[test]
    fn bad_row_in_any_forecast_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("forecast_0h_ahead.csv"),
            "Time,Temp\n2020-01-01T00:00:00Z,1\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("forecast_1h_ahead.csv"),
            "Time,Temp\n2020-01-01T00:00:00Z,1\nbad,2\n",
        )
        .unwrap();

        let err = read_weather_input(dir.path(), &hourly()).unwrap_err();
        assert!(matches!(
            err,
            FeedError::InvalidTimestamp { line: 3, ref value, .. } if value == "bad"
        ));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn missing_root_is_fatal() {
        let err = read_weather_input(Path::new("/nonexistent/weather"), &hourly()).unwrap_err();
        assert!(matches!(err, FeedError::Walk { .. }));
    }
}
