//! CSV file data adapter.
//!
//! Reads `<dir>/<SYMBOL>.csv` with the header
//! `timestamp,open,high,low,close,volume`. Timestamps may be RFC 3339,
//! `YYYY-MM-DD HH:MM:SS` (taken as UTC) or a bare `YYYY-MM-DD`. A row with
//! a non-finite or non-positive price, or a bad volume, fails the whole
//! file.

use crate::domain::bar::Bar;
use crate::domain::error::TraderError;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, TraderError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| TraderError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for (line, result) in rdr.deserialize::<CsvRow>().enumerate() {
            let row = result.map_err(|e| TraderError::Data {
                reason: format!("{}: CSV parse error: {}", path.display(), e),
            })?;
            let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| TraderError::Data {
                reason: format!(
                    "{}: invalid timestamp '{}' on row {}",
                    path.display(),
                    row.timestamp,
                    line + 1
                ),
            })?;

            let bar = Bar {
                timestamp,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            };
            if let Some((field, value)) = bar.invalid_field() {
                return Err(TraderError::Data {
                    reason: format!(
                        "{}: invalid {} '{}' on row {}",
                        path.display(),
                        field,
                        value,
                        line + 1
                    ),
                });
            }
            bars.push(bar);
        }

        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, TraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| TraderError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TraderError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "timestamp,open,high,low,close,volume\n\
            2024-01-02T14:32:00Z,101.0,102.0,100.5,101.5,1500\n\
            2024-01-02T14:30:00Z,100.0,101.0,99.0,100.5,1000\n\
            2024-01-02T14:31:00Z,100.5,101.5,100.0,101.0,1200.5\n";

        fs::write(path.join("AAPL.csv"), csv_content).unwrap();
        fs::write(path.join("MSFT.csv"), "timestamp,open,high,low,close,volume\n").unwrap();
        fs::write(path.join("notes.txt"), "not data").unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_bars_returns_sorted_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_bars("AAPL").unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(
            bars[0].timestamp,
            Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap()
        );
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].high, 101.0);
        assert_eq!(bars[0].low, 99.0);
        assert_eq!(bars[0].close, 100.5);
        assert_eq!(bars[0].volume, 1000.0);
        assert_eq!(bars[1].volume, 1200.5);
        assert!(crate::domain::bar::is_ascending(&bars));
    }

    #[test]
    fn header_only_file_is_empty() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert!(adapter.fetch_bars("MSFT").unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_data_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        let err = adapter.fetch_bars("XYZ").unwrap_err();
        assert!(matches!(err, TraderError::Data { .. }));
    }

    #[test]
    fn bad_number_is_data_error() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("BAD.csv"),
            "timestamp,open,high,low,close,volume\n2024-01-02,abc,1,1,1,1\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        assert!(matches!(
            adapter.fetch_bars("BAD").unwrap_err(),
            TraderError::Data { .. }
        ));
    }

    #[test]
    fn bad_timestamp_is_data_error() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("BAD.csv"),
            "timestamp,open,high,low,close,volume\nyesterday,1,1,1,1,1\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let err = adapter.fetch_bars("BAD").unwrap_err();
        assert!(err.to_string().contains("yesterday"));
    }

    #[test]
    fn non_finite_close_is_data_error() {
        let dir = TempDir::new().unwrap();
        let mut content = String::from("timestamp,open,high,low,close,volume\n");
        for i in 0..12 {
            let close = if i == 5 { "NaN".to_string() } else { format!("{}", 100 + i) };
            content.push_str(&format!("2024-01-02 14:{:02}:00,100,101,99,{},1000\n", 30 + i, close));
        }
        fs::write(dir.path().join("GAP.csv"), content).unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());

        let err = adapter.fetch_bars("GAP").unwrap_err();
        assert!(matches!(err, TraderError::Data { .. }));
        let msg = err.to_string();
        assert!(msg.contains("invalid close"), "{msg}");
        assert!(msg.contains("row 6"), "{msg}");
    }

    #[test]
    fn negative_volume_is_data_error() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("NEG.csv"),
            "timestamp,open,high,low,close,volume\n2024-01-02,1,1,1,1,-5\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let err = adapter.fetch_bars("NEG").unwrap_err();
        assert!(err.to_string().contains("invalid volume"));
    }

    #[test]
    fn timestamp_formats() {
        let rfc = parse_timestamp("2024-01-02T09:30:00-05:00").unwrap();
        assert_eq!(rfc.hour(), 14);
        let spaced = parse_timestamp("2024-01-02 14:30:00").unwrap();
        assert_eq!(spaced, Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap());
        let day = parse_timestamp("2024-01-02").unwrap();
        assert_eq!(day, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
        assert!(parse_timestamp("02/01/2024").is_none());
    }

    #[test]
    fn list_symbols_returns_csv_stems() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert_eq!(adapter.list_symbols().unwrap(), vec!["AAPL", "MSFT"]);
    }
}
