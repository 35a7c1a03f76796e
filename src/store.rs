//! Append-only dataset with (station id, query time) deduplication
//!
//! Every append is a read-snapshot / compute-delta / atomic-replace
//! transaction: the file is reloaded, colliding candidates are discarded, and
//! the combined rows are written to a temp file in the same directory which
//! then replaces the dataset. Existing rows are carried over verbatim.

use crate::error::{PumpwatchError, Result};
use crate::logging::{StructuredLogger, get_logger};
use crate::model::{Location, PriceRecord, format_query_time, parse_query_time};
use chrono::{DateTime, SecondsFormat, Utc};
use csv::StringRecord;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Canonical column set of the persisted dataset
pub const COLUMNS: [&str; 9] = [
    "Station ID",
    "Station Name",
    "Address",
    "Location",
    "Query Time",
    "Regular Last Update Time",
    "Regular Price",
    "Premium Last Update Time",
    "Premium Price",
];

const STATION_ID_COL: usize = 0;
const QUERY_TIME_COL: usize = 4;

/// In-memory snapshot of the dataset file
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<StringRecord>,
    keys: HashSet<(String, String)>,
}

impl Dataset {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a dataset; a missing or zero-length file is an empty dataset
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::metadata(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::empty()),
            Err(e) => {
                return Err(PumpwatchError::persistence(format!(
                    "Failed to stat {}: {}",
                    path.display(),
                    e
                )));
            }
            Ok(meta) if meta.len() == 0 => return Ok(Self::empty()),
            Ok(_) => {}
        }

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| {
                PumpwatchError::persistence(format!("Failed to open {}: {}", path.display(), e))
            })?;

        let headers = rdr.headers()?.clone();
        if !headers.iter().eq(COLUMNS.iter().copied()) {
            return Err(PumpwatchError::persistence(format!(
                "Unexpected columns in {}: {:?}",
                path.display(),
                headers
            )));
        }

        let mut dataset = Self::empty();
        for (line_num, result) in rdr.records().enumerate() {
            let row = result.map_err(|e| {
                PumpwatchError::persistence(format!(
                    "Failed to read {} at line {}: {}",
                    path.display(),
                    line_num + 2,
                    e
                ))
            })?;
            dataset.push_row(row);
        }
        Ok(dataset)
    }

    fn push_row(&mut self, row: StringRecord) {
        self.keys.insert(row_key(&row));
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether a row with this dedup key exists
    pub fn contains(&self, station_id: &str, query_time: &str) -> bool {
        self.keys
            .contains(&(station_id.trim().to_string(), query_time.trim().to_string()))
    }

    /// Raw rows in file order
    pub fn rows(&self) -> &[StringRecord] {
        &self.rows
    }

    /// Typed view of every row
    pub fn records(&self) -> Result<Vec<PriceRecord>> {
        self.rows.iter().map(row_to_record).collect()
    }

    /// Replace `path` with this dataset in one atomic step
    pub fn write_atomic<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_rows_atomic(path.as_ref(), &COLUMNS, self.rows.iter())
    }
}

/// Dedup key of a stored row, compared on trimmed cells
fn row_key(row: &StringRecord) -> (String, String) {
    (
        row.get(STATION_ID_COL).unwrap_or_default().trim().to_string(),
        row.get(QUERY_TIME_COL).unwrap_or_default().trim().to_string(),
    )
}

fn fmt_timestamp(ts: &Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

fn fmt_price(price: Option<f64>) -> String {
    price.map(|p| p.to_string()).unwrap_or_default()
}

fn parse_timestamp(raw: &str) -> Result<Option<DateTime<Utc>>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    Ok(Some(
        DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc),
    ))
}

fn parse_price(field: &str, raw: &str) -> Result<Option<f64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|e| PumpwatchError::validation(field, e.to_string().as_str()))
}

/// Render a record in canonical column order
pub fn record_to_row(record: &PriceRecord) -> Result<StringRecord> {
    let location = serde_json::to_string(&record.location)?;
    Ok(StringRecord::from(vec![
        record.station_id.clone(),
        record.station_name.clone(),
        record.address.clone(),
        location,
        format_query_time(&record.query_time),
        fmt_timestamp(&record.regular_last_update),
        fmt_price(record.regular_price),
        fmt_timestamp(&record.premium_last_update),
        fmt_price(record.premium_price),
    ]))
}

/// Parse a canonical row back into a record
pub fn row_to_record(row: &StringRecord) -> Result<PriceRecord> {
    if row.len() < COLUMNS.len() {
        return Err(PumpwatchError::malformed(format!(
            "row has {} columns, expected {}",
            row.len(),
            COLUMNS.len()
        )));
    }
    let cell = |idx: usize| row.get(idx).unwrap_or_default();

    let location = if cell(3).trim().is_empty() {
        Location::default()
    } else {
        serde_json::from_str(cell(3))?
    };

    Ok(PriceRecord {
        station_id: cell(0).to_string(),
        station_name: cell(1).to_string(),
        address: cell(2).to_string(),
        location,
        query_time: parse_query_time(cell(4))?,
        regular_last_update: parse_timestamp(cell(5))?,
        regular_price: parse_price(COLUMNS[6], cell(6))?,
        premium_last_update: parse_timestamp(cell(7))?,
        premium_price: parse_price(COLUMNS[8], cell(8))?,
    })
}

/// Write `header` + `rows` to a sibling temp file, fsync, then rename over `path`
pub(crate) fn write_rows_atomic<'a, I>(path: &Path, header: &[&str], rows: I) -> Result<()>
where
    I: IntoIterator<Item = &'a StringRecord>,
{
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    {
        let mut wtr = csv::Writer::from_writer(&mut tmp);
        wtr.write_record(header)?;
        for row in rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
    }
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .map_err(|e| PumpwatchError::persistence(format!("Failed to replace dataset: {}", e)))?;
    Ok(())
}

/// Dataset file with idempotent, append-only writes
pub struct DedupStore {
    path: PathBuf,
    logger: StructuredLogger,
}

impl DedupStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            logger: get_logger("store"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current snapshot of the dataset
    pub fn load(&self) -> Result<Dataset> {
        Dataset::load(&self.path)
    }

    /// Append the records whose (station id, query time) is not yet stored
    ///
    /// Returns the number of rows written. Duplicates within `records` are
    /// dropped too, first occurrence wins. When nothing survives the file is
    /// left untouched.
    pub fn append(&self, records: &[PriceRecord]) -> Result<usize> {
        let mut dataset = self.load().inspect_err(|e| {
            self.logger.error(&format!(
                "Failed to load dataset {}: {}",
                self.path.display(),
                e
            ));
        })?;

        let mut written = 0;
        for record in records {
            let (station_id, query_time) = record.dedup_key();
            if dataset.contains(&station_id, &query_time) {
                self.logger.debug(&format!(
                    "Skipping duplicate row station={} query_time={}",
                    station_id, query_time
                ));
                continue;
            }
            dataset.push_row(record_to_row(record)?);
            written += 1;
        }

        if written == 0 {
            self.logger.debug("No new data to save.");
            return Ok(0);
        }

        dataset
            .write_atomic(&self.path)
            .map_err(|e| match e {
                PumpwatchError::Persistence { .. } => e,
                other => PumpwatchError::persistence(other.to_string()),
            })
            .inspect_err(|e| {
                self.logger.error(&format!(
                    "Failed to write dataset {}: {}",
                    self.path.display(),
                    e
                ));
            })?;

        self.logger.info(&format!(
            "Appended {} rows to {} ({} total)",
            written,
            self.path.display(),
            dataset.len()
        ));
        Ok(written)
    }
}

/// Append `records` to the dataset at `path`; see [`DedupStore::append`]
pub fn append<P: Into<PathBuf>>(path: P, records: &[PriceRecord]) -> Result<usize> {
    DedupStore::new(path).append(records)
}
