//! CSV file data adapter.
//!
//! One file per instrument and bar size: `<dir>/<INSTRUMENT>.csv` for daily
//! bars, `<dir>/<INSTRUMENT>_1m.csv` / `_1h.csv` for intraday. Columns are
//! `timestamp,open,high,low,close,volume`; an empty cell is read as NaN so
//! the bar survives as a data gap.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::error::DataError;
use crate::domain::ohlcv::{Bar, BarSize, Series};
use crate::ports::data_port::DataPort;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, instrument: &str, bar_size: BarSize) -> PathBuf {
        match bar_size {
            BarSize::Day => self.base_path.join(format!("{instrument}.csv")),
            other => self.base_path.join(format!("{instrument}_{other}.csv")),
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_field(record: &csv::StringRecord, idx: usize, name: &str, line: u64) -> Result<f64, DataError> {
    let raw = record
        .get(idx)
        .ok_or_else(|| DataError::Malformed(format!("line {line}: missing {name} column")))?;
    if raw.is_empty() {
        return Ok(f64::NAN);
    }
    raw.parse()
        .map_err(|e| DataError::Malformed(format!("line {line}: invalid {name} value '{raw}': {e}")))
}

impl DataPort for CsvAdapter {
    fn fetch(
        &self,
        instrument: &str,
        start: NaiveDate,
        end: NaiveDate,
        bar_size: BarSize,
    ) -> Result<Series, DataError> {
        let path = self.csv_path(instrument, bar_size);
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => DataError::UnknownInstrument(instrument.to_string()),
            _ => DataError::TemporarilyUnavailable(format!(
                "failed to read {}: {}",
                path.display(),
                e
            )),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record =
                result.map_err(|e| DataError::Malformed(format!("CSV parse error: {e}")))?;
            let line = record.position().map_or(0, |p| p.line());

            let raw_ts = record
                .get(0)
                .ok_or_else(|| DataError::Malformed(format!("line {line}: missing timestamp")))?;
            let timestamp = parse_timestamp(raw_ts).ok_or_else(|| {
                DataError::Malformed(format!("line {line}: invalid timestamp '{raw_ts}'"))
            })?;

            let day = timestamp.date();
            if day < start || day > end {
                continue;
            }

            bars.push(Bar {
                timestamp,
                open: parse_field(&record, 1, "open", line)?,
                high: parse_field(&record, 2, "high", line)?,
                low: parse_field(&record, 3, "low", line)?,
                close: parse_field(&record, 4, "close", line)?,
                volume: parse_field(&record, 5, "volume", line)?,
            });
        }

        tracing::debug!(instrument, bars = bars.len(), path = %path.display(), "loaded csv");
        Ok(Series::new(instrument, bars))
    }
}
