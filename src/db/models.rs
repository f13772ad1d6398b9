//! Price store data models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A closing-price column of the `prices` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceColumn {
    MstrClose,
    BtcUsdClose,
    IbitClose,
}

impl PriceColumn {
    /// Every value column of the table, in table order
    pub const ALL: [PriceColumn; 3] = [
        PriceColumn::MstrClose,
        PriceColumn::BtcUsdClose,
        PriceColumn::IbitClose,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceColumn::MstrClose => "mstr_close",
            PriceColumn::BtcUsdClose => "btc_usd_close",
            PriceColumn::IbitClose => "ibit_close",
        }
    }
}

impl fmt::Display for PriceColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored row of the `prices` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub date: NaiveDate,
    pub mstr_close: Option<f64>,
    pub btc_usd_close: Option<f64>,
    pub ibit_close: Option<f64>,
    pub source: String,
    pub asof: DateTime<Utc>,
}

impl PriceRow {
    /// Row with every value column null
    pub fn empty(date: NaiveDate, source: &str, asof: DateTime<Utc>) -> Self {
        Self {
            date,
            mstr_close: None,
            btc_usd_close: None,
            ibit_close: None,
            source: source.to_string(),
            asof,
        }
    }

    pub fn get(&self, column: PriceColumn) -> Option<f64> {
        match column {
            PriceColumn::MstrClose => self.mstr_close,
            PriceColumn::BtcUsdClose => self.btc_usd_close,
            PriceColumn::IbitClose => self.ibit_close,
        }
    }

    pub fn set(&mut self, column: PriceColumn, value: Option<f64>) {
        match column {
            PriceColumn::MstrClose => self.mstr_close = value,
            PriceColumn::BtcUsdClose => self.btc_usd_close = value,
            PriceColumn::IbitClose => self.ibit_close = value,
        }
    }
}

/// Closing prices for one date, as handed to analysis code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub mstr_close: Option<f64>,
    pub btc_usd_close: Option<f64>,
    pub ibit_close: Option<f64>,
}

impl PriceRecord {
    pub fn get(&self, column: PriceColumn) -> Option<f64> {
        match column {
            PriceColumn::MstrClose => self.mstr_close,
            PriceColumn::BtcUsdClose => self.btc_usd_close,
            PriceColumn::IbitClose => self.ibit_close,
        }
    }
}

impl From<PriceRow> for PriceRecord {
    fn from(row: PriceRow) -> Self {
        Self {
            date: row.date,
            mstr_close: row.mstr_close,
            btc_usd_close: row.btc_usd_close,
            ibit_close: row.ibit_close,
        }
    }
}
