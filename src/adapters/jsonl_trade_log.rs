//! Append-only trade log, one JSON object per line.

use crate::domain::error::TraderError;
use crate::domain::position::ExitRecord;
use crate::ports::trade_log_port::TradeLogPort;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

pub struct JsonlTradeLog {
    path: PathBuf,
}

impl JsonlTradeLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TradeLogPort for JsonlTradeLog {
    fn append(&mut self, record: &ExitRecord) -> Result<(), TraderError> {
        let line = serde_json::to_string(record).map_err(|e| TraderError::TradeLog {
            reason: format!("failed to encode record for {}: {}", record.symbol, e),
        })?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<ExitRecord>, TraderError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: ExitRecord = serde_json::from_str(&line).map_err(|e| TraderError::TradeLog {
                reason: format!("{} line {}: {}", self.path.display(), index + 1, e),
            })?;
            records.push(record);
        }
        Ok(records)
    }
}
