//! Runtime configuration
//!
//! Every component receives its store location and tracked series from an
//! [`AppConfig`]; nothing resolves a path on its own.

use crate::db::models::PriceColumn;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default location of the price store, relative to the working directory
pub const DEFAULT_DB_PATH: &str = "data/db/mstr_btc.duckdb";

/// Source label stamped on every row written by a sync run
pub const DEFAULT_SOURCE: &str = "yahoo";

/// One provider symbol mapped onto a stored column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedSeries {
    pub symbol: String,
    pub column: PriceColumn,
    /// Disabled entries are not fetched; their column is written as null
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl TrackedSeries {
    pub fn new(symbol: &str, column: PriceColumn) -> Self {
        Self {
            symbol: symbol.to_string(),
            column,
            enabled: true,
        }
    }

    pub fn disabled(symbol: &str, column: PriceColumn) -> Self {
        Self {
            enabled: false,
            ..Self::new(symbol, column)
        }
    }
}

/// How an incoming row is combined with a stored row for the same date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertMode {
    /// Replace the whole stored row. Columns not fetched this run become null.
    #[default]
    ReplaceRow,
    /// Overwrite only the columns fetched this run, plus `source` and `asof`.
    /// This is a behavior change against `ReplaceRow` and must be opted into.
    MergeColumns,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub source: String,
    pub tracked: Vec<TrackedSeries>,
    pub http_timeout_secs: u64,
    #[serde(default)]
    pub upsert_mode: UpsertMode,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            source: DEFAULT_SOURCE.to_string(),
            tracked: vec![
                TrackedSeries::new("MSTR", PriceColumn::MstrClose),
                TrackedSeries::new("BTC-USD", PriceColumn::BtcUsdClose),
                // enable when the ETF should be stored as well
                TrackedSeries::disabled("IBIT", PriceColumn::IbitClose),
            ],
            http_timeout_secs: 30,
            upsert_mode: UpsertMode::default(),
        }
    }
}

impl AppConfig {
    /// Default configuration pointing at another store file
    pub fn with_db_path(path: impl AsRef<Path>) -> Self {
        Self {
            db_path: path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Enabled series in declaration order
    pub fn active_series(&self) -> impl Iterator<Item = &TrackedSeries> {
        self.tracked.iter().filter(|s| s.enabled)
    }

    /// Reject configurations the sync job cannot apply unambiguously
    pub fn validate(&self) -> Result<()> {
        if self.source.trim().is_empty() {
            return Err(AppError::Config("source label must not be empty".to_string()));
        }

        let mut seen = HashSet::new();
        for series in self.active_series() {
            if series.symbol.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "empty provider symbol for column {}",
                    series.column
                )));
            }
            if !seen.insert(series.column) {
                return Err(AppError::Config(format!(
                    "column {} is tracked by more than one symbol",
                    series.column
                )));
            }
        }

        Ok(())
    }
}
