//! DuckDB price store

pub mod models;
pub mod prices;
pub mod schema;

use crate::config::UpsertMode;
use crate::error::{AppError, Result};
use chrono::NaiveDate;
use duckdb::{AccessMode, Config, Connection};
use models::{PriceColumn, PriceRecord, PriceRow};
use parking_lot::Mutex;
use std::path::Path;

/// DuckDB database wrapper
pub struct PriceDb {
    conn: Mutex<Connection>,
}

impl PriceDb {
    /// Open (or create) the store for reading and writing
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        tracing::debug!("Opened price store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an existing store without write access
    pub fn open_read_only(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AppError::NotFound(format!(
                "Database not found at: {}",
                path.display()
            )));
        }

        let config = Config::default().access_mode(AccessMode::ReadOnly)?;
        let conn = Connection::open_with_flags(path, config)?;
        tracing::debug!("Opened price store read-only at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Transient store, used by tests
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create the prices, events and meta tables if absent
    pub fn ensure_schema(&self) -> Result<()> {
        let conn = self.conn.lock();
        schema::ensure_schema(&conn)
    }

    /// Latest stored date
    pub fn max_date(&self) -> Result<Option<NaiveDate>> {
        let conn = self.conn.lock();
        prices::max_date(&conn)
    }

    /// Number of stored price rows
    pub fn count_prices(&self) -> Result<i64> {
        let conn = self.conn.lock();
        prices::count_prices(&conn)
    }

    /// Upsert price rows keyed on date
    pub fn upsert_prices(
        &self,
        rows: &[PriceRow],
        mode: UpsertMode,
        fetched: &[PriceColumn],
    ) -> Result<usize> {
        let mut conn = self.conn.lock();
        prices::upsert_prices(&mut conn, rows, mode, fetched)
    }

    /// Closing prices ordered by date
    pub fn load_prices(&self) -> Result<Vec<PriceRecord>> {
        let conn = self.conn.lock();
        prices::load_prices(&conn)
    }

    /// Full rows ordered by date
    pub fn load_rows(&self) -> Result<Vec<PriceRow>> {
        let conn = self.conn.lock();
        prices::load_rows(&conn)
    }
}
