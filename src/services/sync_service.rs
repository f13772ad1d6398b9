//! Sync Service
//!
//! Keeps the local `prices` table in step with the market-data provider.
//! Each run asks only for the dates after the latest stored one, joins the
//! tracked series on date and upserts the result keyed on `date`.

use crate::config::AppConfig;
use crate::db::models::{PriceColumn, PriceRow};
use crate::db::PriceDb;
use crate::error::Result;
use crate::providers::{DailyClose, PriceProvider};
use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

/// Stand-in for the latest stored date when the table is empty, so the
/// first run starts at the provider's earliest history.
pub fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

/// Inclusive date range requested from the provider in one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SyncWindow {
    /// Window from the day after `last_date` through `today`, `None` when
    /// already up to date
    pub fn after(last_date: Option<NaiveDate>, today: NaiveDate) -> Option<Self> {
        let start = last_date.unwrap_or_else(epoch) + Duration::days(1);
        if start > today {
            return None;
        }
        Some(Self { start, end: today })
    }
}

impl fmt::Display for SyncWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// What one provider call produced
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesFetch {
    Data(Vec<DailyClose>),
    /// The provider answered but had no bars in the window
    Empty,
    /// The call failed; stored like `Empty`, reported separately
    Unavailable(String),
}

impl SeriesFetch {
    fn from_result(result: Result<Vec<DailyClose>>) -> Self {
        match result {
            Ok(rows) if rows.is_empty() => SeriesFetch::Empty,
            Ok(rows) => SeriesFetch::Data(rows),
            Err(e) => SeriesFetch::Unavailable(e.to_string()),
        }
    }
}

/// Per-series outcome of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SeriesStatus {
    Fetched { rows: usize },
    Empty,
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesReport {
    pub symbol: String,
    pub column: PriceColumn,
    #[serde(flatten)]
    pub status: SeriesStatus,
}

/// Result of a sync run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The window was empty; no provider call and no write happened
    UpToDate { last_date: Option<NaiveDate> },
    /// No series returned data; nothing was written
    NothingFetched {
        window: SyncWindow,
        series: Vec<SeriesReport>,
    },
    Upserted {
        window: SyncWindow,
        rows: usize,
        series: Vec<SeriesReport>,
    },
}

impl SyncOutcome {
    /// Rows written by the run, 0 for the no-op outcomes
    pub fn rows_upserted(&self) -> usize {
        match self {
            SyncOutcome::Upserted { rows, .. } => *rows,
            _ => 0,
        }
    }

    pub fn series(&self) -> &[SeriesReport] {
        match self {
            SyncOutcome::UpToDate { .. } => &[],
            SyncOutcome::NothingFetched { series, .. } | SyncOutcome::Upserted { series, .. } => {
                series.as_slice()
            }
        }
    }

    /// Human-readable status line
    pub fn status_line(&self) -> String {
        match self {
            SyncOutcome::UpToDate { .. } => "No new dates to fetch.".to_string(),
            SyncOutcome::NothingFetched { .. } => "Nothing fetched.".to_string(),
            SyncOutcome::Upserted { rows, .. } => format!("Upserted {} rows into prices", rows),
        }
    }
}

/// Outer-join the fetched series on date.
///
/// Every row carries all value columns; a column with no bar on a date, or
/// not fetched at all, stays null. Rows come out ascending by date, all
/// stamped with the same `source` and `asof`.
pub fn align_series(
    series: &[(PriceColumn, Vec<DailyClose>)],
    source: &str,
    asof: DateTime<Utc>,
) -> Vec<PriceRow> {
    let mut rows: BTreeMap<NaiveDate, PriceRow> = BTreeMap::new();

    for (column, closes) in series {
        for close in closes {
            rows.entry(close.date)
                .or_insert_with(|| PriceRow::empty(close.date, source, asof))
                .set(*column, Some(close.close));
        }
    }

    rows.into_values().collect()
}

/// Sync service for business logic
pub struct SyncService;

impl SyncService {
    /// Sync through today's local date, stamping rows with the current time
    pub async fn sync(
        db: &PriceDb,
        provider: &dyn PriceProvider,
        config: &AppConfig,
    ) -> Result<SyncOutcome> {
        let today = Local::now().date_naive();
        Self::sync_at(db, provider, config, today, Utc::now()).await
    }

    /// Sync with an explicit current date and write timestamp
    pub async fn sync_at(
        db: &PriceDb,
        provider: &dyn PriceProvider,
        config: &AppConfig,
        today: NaiveDate,
        asof: DateTime<Utc>,
    ) -> Result<SyncOutcome> {
        config.validate()?;

        let last_date = db.max_date()?;
        let window = match SyncWindow::after(last_date, today) {
            Some(window) => window,
            None => {
                info!("Prices are up to date (last stored date {:?})", last_date);
                return Ok(SyncOutcome::UpToDate { last_date });
            }
        };

        info!(
            "SyncService::sync - last stored {:?}, fetching {}",
            last_date, window
        );

        Self::sync_range(db, provider, config, window, asof).await
    }

    /// Fetch every active series over `window` and upsert the joined rows.
    ///
    /// Provider failures are downgraded to "no data for that symbol" and
    /// only show up in the returned report.
    pub async fn sync_range(
        db: &PriceDb,
        provider: &dyn PriceProvider,
        config: &AppConfig,
        window: SyncWindow,
        asof: DateTime<Utc>,
    ) -> Result<SyncOutcome> {
        let mut fetched: Vec<(PriceColumn, Vec<DailyClose>)> = Vec::new();
        let mut reports = Vec::new();

        for series in config.active_series() {
            let result = provider
                .fetch_daily_closes(&series.symbol, window.start, window.end)
                .await;

            let status = match SeriesFetch::from_result(result) {
                SeriesFetch::Data(closes) => {
                    info!("{}: {} daily closes", series.symbol, closes.len());
                    let status = SeriesStatus::Fetched { rows: closes.len() };
                    fetched.push((series.column, closes));
                    status
                }
                SeriesFetch::Empty => {
                    info!("{}: no data in {}", series.symbol, window);
                    SeriesStatus::Empty
                }
                SeriesFetch::Unavailable(reason) => {
                    warn!("{}: fetch failed, treating as no data: {}", series.symbol, reason);
                    SeriesStatus::Unavailable { reason }
                }
            };

            reports.push(SeriesReport {
                symbol: series.symbol.clone(),
                column: series.column,
                status,
            });
        }

        if fetched.is_empty() {
            info!("No series returned data for {}", window);
            return Ok(SyncOutcome::NothingFetched {
                window,
                series: reports,
            });
        }

        let rows = align_series(&fetched, &config.source, asof);
        let columns: Vec<PriceColumn> = fetched.iter().map(|(column, _)| *column).collect();

        let count = db.upsert_prices(&rows, config.upsert_mode, &columns)?;
        info!("Upserted {} rows into prices ({:?})", count, config.upsert_mode);

        Ok(SyncOutcome::Upserted {
            window,
            rows: count,
            series: reports,
        })
    }
}
