//! CSV ingest shared by the production and weather readers.
//!
//! Turns a CSV file with a `Time` column into `(timestamp, Record)` rows.
//! Every problem here is fatal: a replay over partially read input is worse
//! than no replay at all.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use csv::StringRecord;

use crate::domain::Record;
use crate::error::{FeedError, Result};

/// Name of the timestamp column (matched case-insensitively).
pub const TIME_COLUMN: &str = "time";

/// One parsed CSV row.
#[derive(Debug, Clone)]
pub struct TimedRecord {
    /// 1-based line number in the source file.
    pub line: usize,
    pub time: DateTime<Utc>,
    pub record: Record,
}

/// Read every row of the CSV file at `path`.
pub fn read_timed_records(path: &Path) -> Result<Vec<TimedRecord>> {
    let file = File::open(path).map_err(|source| FeedError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_timed_records_from(file, path)
}

/// Like `read_timed_records`, reading from any source; `path` is only used in
/// error messages.
pub fn read_timed_records_from<R: Read>(source: R, path: &Path) -> Result<Vec<TimedRecord>> {
    let csv_err = |source: csv::Error| FeedError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(normalize_header_name)
        .collect();

    let time_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(TIME_COLUMN))
        .ok_or_else(|| FeedError::MissingTimeColumn {
            path: path.to_path_buf(),
        })?;

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header line
        let line = idx + 2;
        let record = result.map_err(csv_err)?;
        rows.push(parse_row(&record, &headers, time_idx, line, path)?);
    }
    Ok(rows)
}

fn parse_row(
    record: &StringRecord,
    headers: &[String],
    time_idx: usize,
    line: usize,
    path: &Path,
) -> Result<TimedRecord> {
    let raw_time = record.get(time_idx).unwrap_or("");
    let time = parse_timestamp(raw_time).ok_or_else(|| FeedError::InvalidTimestamp {
        path: path.to_path_buf(),
        line,
        value: raw_time.to_string(),
    })?;

    let mut values = Record::new();
    for (idx, (name, cell)) in headers.iter().zip(record.iter()).enumerate() {
        if idx != time_idx {
            values.insert_cell(name, cell);
        }
    }

    Ok(TimedRecord {
        line,
        time,
        record: values,
    })
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a BOM.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

/// Parse a `Time` cell.
///
/// RFC 3339 is the canonical format. Naive date-times are taken as UTC, and a
/// bare integer is read as Unix seconds.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    const NAIVE_FMTS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    for fmt in NAIVE_FMTS {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(t.and_utc());
        }
    }
    s.parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}
