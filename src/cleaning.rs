//! Downstream cleaning of a stored dataset
//!
//! Reads the raw dataset, never writes it. The cleaned copy keeps only rows
//! with a parseable query time and at least one price, tags each row with a
//! time-of-day bucket, keeps one row per station, bucket and day, and is
//! ordered by station id.

use crate::config::TimeTagConfig;
use crate::error::Result;
use crate::logging::get_logger;
use crate::model::parse_query_time;
use crate::store::{COLUMNS, Dataset, write_rows_atomic};
use chrono::{NaiveDate, Timelike};
use csv::StringRecord;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::Path;

/// Tag used when no window matches
pub const FALLBACK_TAG: &str = "other";

/// Header of the extra column appended by cleaning
pub const TIME_TAG_COLUMN: &str = "Time Tag";

const STATION_ID_COL: usize = 0;
const QUERY_TIME_COL: usize = 4;
const REGULAR_PRICE_COL: usize = 6;
const PREMIUM_PRICE_COL: usize = 8;

/// Maps an hour of day to a named bucket
#[derive(Debug, Clone)]
pub struct TimeTagger {
    windows: Vec<TimeTagConfig>,
}

impl TimeTagger {
    pub fn new(windows: Vec<TimeTagConfig>) -> Self {
        Self { windows }
    }

    pub fn from_config(windows: &[TimeTagConfig]) -> Self {
        Self::new(windows.to_vec())
    }

    /// First window with `start_hour <= hour < end_hour`, else [`FALLBACK_TAG`]
    pub fn tag(&self, hour: u32) -> &str {
        self.windows
            .iter()
            .find(|w| w.start_hour <= hour && hour < w.end_hour)
            .map(|w| w.tag.as_str())
            .unwrap_or(FALLBACK_TAG)
    }
}

/// A stored row with its time-of-day bucket
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedRow {
    pub row: StringRecord,
    pub time_tag: String,
}

impl CleanedRow {
    pub fn station_id(&self) -> &str {
        self.row.get(STATION_ID_COL).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CleanedDataset {
    pub rows: Vec<CleanedRow>,
}

impl CleanedDataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Atomically write the canonical columns plus `Time Tag`
    pub fn write_atomic<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut header: Vec<&str> = COLUMNS.to_vec();
        header.push(TIME_TAG_COLUMN);

        let rows: Vec<StringRecord> = self
            .rows
            .iter()
            .map(|r| {
                let mut row = r.row.clone();
                row.push_field(&r.time_tag);
                row
            })
            .collect();
        write_rows_atomic(path.as_ref(), &header, rows.iter())
    }
}

fn is_blank(row: &StringRecord, idx: usize) -> bool {
    row.get(idx).is_none_or(|v| v.trim().is_empty())
}

/// Numeric ids sort numerically, anything else after them lexically
fn compare_station_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

pub fn clean_dataset(dataset: &Dataset, tagger: &TimeTagger) -> CleanedDataset {
    let logger = get_logger("cleaning");
    let mut seen: HashSet<(String, String, NaiveDate)> = HashSet::new();
    let mut rows = Vec::new();
    let mut unparseable = 0usize;
    let mut unpriced = 0usize;

    for row in dataset.rows() {
        let Ok(query_time) = parse_query_time(row.get(QUERY_TIME_COL).unwrap_or_default()) else {
            unparseable += 1;
            continue;
        };
        if is_blank(row, REGULAR_PRICE_COL) && is_blank(row, PREMIUM_PRICE_COL) {
            unpriced += 1;
            continue;
        }

        let time_tag = tagger.tag(query_time.hour()).to_string();
        let station_id = row.get(STATION_ID_COL).unwrap_or_default().to_string();
        if !seen.insert((station_id, time_tag.clone(), query_time.date())) {
            continue;
        }
        rows.push(CleanedRow {
            row: row.clone(),
            time_tag,
        });
    }

    rows.sort_by(|a, b| compare_station_ids(a.station_id(), b.station_id()));

    logger.info(&format!(
        "Cleaned {} rows into {} ({} bad query time, {} without prices)",
        dataset.len(),
        rows.len(),
        unparseable,
        unpriced
    ));
    CleanedDataset { rows }
}

/// Load `input`, clean it and write the result to `output`
pub fn clean_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    tagger: &TimeTagger,
) -> Result<CleanedDataset> {
    let dataset = Dataset::load(input)?;
    let cleaned = clean_dataset(&dataset, tagger);
    cleaned.write_atomic(output)?;
    Ok(cleaned)
}
