//! CSV price history adapter.
//!
//! Columns: `timestamp,open,high,low,close,volume[,sentiment]`. Values are
//! parsed here but only range-checked by the simulator at the step where
//! they are consumed.

use std::fs;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;

use crate::domain::error::TradeboxError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parse one data row. `line` is 1-based and counts the header.
pub fn parse_row(record: &StringRecord, line: usize) -> Result<OhlcvBar, TradeboxError> {
    let field = |idx: usize, name: &str| {
        record.get(idx).map(str::trim).ok_or_else(|| TradeboxError::Data {
            reason: format!("line {line}: missing {name} column"),
        })
    };
    let number = |idx: usize, name: &str| -> Result<f64, TradeboxError> {
        let raw = field(idx, name)?;
        raw.parse::<f64>().map_err(|e| TradeboxError::Data {
            reason: format!("line {line}: invalid {name} value '{raw}': {e}"),
        })
    };

    let raw_ts = field(0, "timestamp")?;
    let timestamp = parse_timestamp(raw_ts).ok_or_else(|| TradeboxError::Data {
        reason: format!("line {line}: invalid timestamp '{raw_ts}'"),
    })?;

    let sentiment = match record.get(6).map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(raw.parse::<f64>().map_err(|e| TradeboxError::Data {
            reason: format!("line {line}: invalid sentiment value '{raw}': {e}"),
        })?),
        _ => None,
    };

    Ok(OhlcvBar {
        timestamp,
        open: number(1, "open")?,
        high: number(2, "high")?,
        low: number(3, "low")?,
        close: number(4, "close")?,
        volume: number(5, "volume")?,
        sentiment,
    })
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, TradeboxError> {
        let content = fs::read_to_string(&self.path).map_err(|e| TradeboxError::Data {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for (i, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| TradeboxError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;
            if record.iter().all(|f| f.is_empty()) {
                continue;
            }
            let bar = parse_row(&record, i + 2)?;

            let date = bar.timestamp.date();
            if start_date.is_some_and(|s| date < s) || end_date.is_some_and(|e| date > e) {
                continue;
            }
            bars.push(bar);
        }

        if bars.is_empty() {
            return Err(TradeboxError::NoData {
                path: self.path.display().to_string(),
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }
}
