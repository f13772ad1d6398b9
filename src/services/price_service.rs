//! Price Service
//!
//! Read path over the price store for analysis code. Opens the store
//! read-only, so it needs no write access and leaves concurrency to DuckDB.

use crate::config::AppConfig;
use crate::db::models::{PriceColumn, PriceRecord};
use crate::db::PriceDb;
use crate::error::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Stored closing prices, strictly ascending by date
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceHistory {
    rows: Vec<PriceRecord>,
}

impl PriceHistory {
    /// Build from rows in any order; later duplicates of a date win
    pub fn from_records(mut rows: Vec<PriceRecord>) -> Self {
        rows.sort_by_key(|r| r.date);
        rows.reverse();
        rows.dedup_by_key(|r| r.date);
        rows.reverse();
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row stored for `date`
    pub fn get(&self, date: NaiveDate) -> Option<&PriceRecord> {
        self.rows
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|i| &self.rows[i])
    }

    pub fn first(&self) -> Option<&PriceRecord> {
        self.rows.first()
    }

    pub fn last(&self) -> Option<&PriceRecord> {
        self.rows.last()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    /// One column as a date-indexed series, nulls included
    pub fn column(&self, column: PriceColumn) -> Vec<(NaiveDate, Option<f64>)> {
        self.rows.iter().map(|r| (r.date, r.get(column))).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PriceRecord> {
        self.rows.iter()
    }

    pub fn into_records(self) -> Vec<PriceRecord> {
        self.rows
    }
}

/// Price service for business logic
pub struct PriceService;

impl PriceService {
    /// Load the full price history from the configured store
    pub fn read_prices(config: &AppConfig) -> Result<PriceHistory> {
        Self::read_prices_from(&config.db_path)
    }

    /// Load the full price history from the store at `path`.
    ///
    /// Fails with `AppError::NotFound` when the store was never initialized.
    pub fn read_prices_from(path: &Path) -> Result<PriceHistory> {
        let db = PriceDb::open_read_only(path)?;
        info!("Reading DB from: {}", path.display());

        let history = PriceHistory::from_records(db.load_prices()?);
        info!("Loaded {} price rows", history.len());

        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpsertMode;
    use crate::db::models::PriceRow;
    use crate::error::AppError;
    use chrono::Utc;
    use tempfile::tempdir;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn record(d: &str, btc: f64) -> PriceRecord {
        PriceRecord {
            date: date(d),
            mstr_close: None,
            btc_usd_close: Some(btc),
            ibit_close: None,
        }
    }

    #[test]
    fn test_missing_store_is_not_found() {
        let dir = tempdir().unwrap();
        let config = AppConfig::with_db_path(dir.path().join("missing.duckdb"));

        let err = PriceService::read_prices(&config).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_reads_in_ascending_date_order() {
        let dir = tempdir().unwrap();
        let config = AppConfig::with_db_path(dir.path().join("prices.duckdb"));

        {
            let db = PriceDb::open(&config.db_path).unwrap();
            db.ensure_schema().unwrap();

            let asof = Utc::now();
            let mut rows = Vec::new();
            for (d, btc) in [("2024-01-03", 3.0), ("2024-01-01", 1.0), ("2024-01-02", 2.0)] {
                let mut row = PriceRow::empty(date(d), "yahoo", asof);
                row.btc_usd_close = Some(btc);
                rows.push(row);
            }
            // Second batch rewrites one date; the store still holds one row per date
            db.upsert_prices(&rows, UpsertMode::ReplaceRow, &PriceColumn::ALL).unwrap();
            db.upsert_prices(&rows[1..2], UpsertMode::ReplaceRow, &PriceColumn::ALL).unwrap();
        }

        let history = PriceService::read_prices(&config).unwrap();
        assert_eq!(
            history.dates(),
            vec![date("2024-01-01"), date("2024-01-02"), date("2024-01-03")]
        );
        assert!(history.dates().windows(2).all(|w| w[0] < w[1]));
        assert_eq!(history.get(date("2024-01-02")).unwrap().btc_usd_close, Some(2.0));
        assert_eq!(history.get(date("2024-01-04")), None);
    }

    #[test]
    fn test_empty_store_reads_empty_history() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prices.duckdb");
        PriceDb::open(&path).unwrap().ensure_schema().unwrap();

        let history = PriceService::read_prices_from(&path).unwrap();
        assert!(history.is_empty());
        assert_eq!(history.first(), None);
    }

    #[test]
    fn test_from_records_sorts_and_dedups() {
        let history = PriceHistory::from_records(vec![
            record("2024-01-02", 2.0),
            record("2024-01-01", 1.0),
            record("2024-01-02", 20.0),
        ]);

        assert_eq!(history.len(), 2);
        assert_eq!(history.last().unwrap().btc_usd_close, Some(20.0));
        assert_eq!(
            history.column(PriceColumn::BtcUsdClose),
            vec![(date("2024-01-01"), Some(1.0)), (date("2024-01-02"), Some(20.0))]
        );
        assert_eq!(history.column(PriceColumn::MstrClose)[0].1, None);
    }
}
