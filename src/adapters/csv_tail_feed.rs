//! Quote feed that reads the newest row of a CSV another process appends to.

use std::fs;
use std::path::PathBuf;

use crate::adapters::csv_adapter::parse_row;
use crate::domain::error::TradeboxError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::quote_port::QuotePort;

pub struct CsvTailFeed {
    path: PathBuf,
}

impl CsvTailFeed {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl QuotePort for CsvTailFeed {
    fn latest(&self) -> Result<Option<OhlcvBar>, TradeboxError> {
        let content = fs::read_to_string(&self.path).map_err(|e| TradeboxError::Provider {
            reason: format!("failed to read feed {}: {}", self.path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut last = None;
        for (i, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| TradeboxError::Provider {
                reason: format!("feed parse error: {e}"),
            })?;
            if record.iter().any(|f| !f.is_empty()) {
                last = Some((i + 2, record));
            }
        }

        last.map(|(line, record)| parse_row(&record, line)).transpose()
    }
}
