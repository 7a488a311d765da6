//! Run directory layout.
//!
//! ```text
//! <root>/<YYYYMMDD_HHMMSS>/<TICKER>/data/<TICKER>_<interval>.csv
//! <root>/<YYYYMMDD_HHMMSS>/<TICKER>/charts/<TICKER>_<kind>.html
//! ```

use super::OutputError;
use crate::chart::ChartKind;
use crate::domain::{Interval, Ticker};
use chrono::NaiveDateTime;
use std::path::PathBuf;

pub const RUN_ID_FORMAT: &str = "%Y%m%d_%H%M%S";

/// One invocation's output scope. Created once, then read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    started_at: NaiveDateTime,
    root: PathBuf,
}

impl RunContext {
    pub fn new(root: impl Into<PathBuf>, started_at: NaiveDateTime) -> Self {
        Self {
            started_at,
            root: root.into(),
        }
    }

    /// Context for a run starting now, in local time.
    pub fn now(root: impl Into<PathBuf>) -> Self {
        Self::new(root, chrono::Local::now().naive_local())
    }

    pub fn started_at(&self) -> NaiveDateTime {
        self.started_at
    }

    pub fn id(&self) -> String {
        self.started_at.format(RUN_ID_FORMAT).to_string()
    }

    pub fn run_dir(&self) -> PathBuf {
        self.root.join(self.id())
    }

    pub fn ticker_dir(&self, ticker: &Ticker) -> PathBuf {
        self.run_dir().join(ticker.as_str())
    }

    pub fn data_file(&self, ticker: &Ticker, interval: Interval) -> PathBuf {
        self.ticker_dir(ticker)
            .join("data")
            .join(format!("{ticker}_{interval}.csv"))
    }

    pub fn chart_file(&self, ticker: &Ticker, kind: ChartKind) -> PathBuf {
        self.ticker_dir(ticker)
            .join("charts")
            .join(format!("{ticker}_{kind}.html"))
    }

    /// Create the run directory. Ticker directories are created on write.
    pub fn create(&self) -> Result<PathBuf, OutputError> {
        let dir = self.run_dir();
        std::fs::create_dir_all(&dir).map_err(|source| OutputError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(dir)
    }
}
