//! Services Layer
//!
//! Business logic behind the entry-point commands.
//!
//! # Services
//!
//! - `SyncService` - Incremental fetch-and-upsert of tracked series
//! - `PriceService` - Read-only access to the stored price history

pub mod price_service;
pub mod sync_service;

pub use price_service::{PriceHistory, PriceService};
pub use sync_service::{
    align_series, SeriesFetch, SeriesReport, SeriesStatus, SyncOutcome, SyncService, SyncWindow,
};
