//! MSTR / BTC price store
//!
//! A small pipeline around a local DuckDB file: create the schema, keep
//! the daily adjusted closes of a fixed set of tickers up to date from a
//! market-data provider, and load the stored history for analysis.

pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod providers;
pub mod services;
pub mod state;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging on stderr, filtered by `RUST_LOG`
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mstr_btc_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
