//! Application state management

use crate::config::AppConfig;
use crate::db::PriceDb;
use crate::error::{AppError, Result};
use crate::providers::{PriceProvider, ProviderRegistry};
use std::sync::Arc;
use std::time::Duration;

/// Handles shared by the entry points, built once from an [`AppConfig`]
pub struct AppState {
    pub config: AppConfig,

    /// DuckDB price store
    pub db: Arc<PriceDb>,

    /// Market-data provider selected by `config.source`
    pub provider: Arc<dyn PriceProvider>,
}

impl AppState {
    /// Open the configured store (creating it and its schema if needed)
    /// and resolve the provider
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;

        let registry = ProviderRegistry::new(Duration::from_secs(config.http_timeout_secs));
        let provider = registry.get(&config.source).ok_or_else(|| {
            AppError::Config(format!("Unknown price source: {}", config.source))
        })?;

        let db = open_store(&config)?;
        db.ensure_schema()?;

        Ok(Self::with_parts(config, Arc::new(db), provider))
    }

    /// Assemble state from already-built parts
    pub fn with_parts(config: AppConfig, db: Arc<PriceDb>, provider: Arc<dyn PriceProvider>) -> Self {
        Self {
            config,
            db,
            provider,
        }
    }
}

/// Open the store read-write, creating its parent directory first
pub fn open_store(config: &AppConfig) -> Result<PriceDb> {
    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    tracing::info!("Price store: {:?}", config.db_path);
    PriceDb::open(&config.db_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_new_creates_store_and_schema() {
        let dir = tempdir().unwrap();
        let config = AppConfig::with_db_path(dir.path().join("nested/db/prices.duckdb"));

        let state = AppState::new(config.clone()).unwrap();
        assert!(config.db_path.exists());
        assert_eq!(state.provider.id(), "yahoo");
        assert_eq!(state.db.max_date().unwrap(), None);
    }

    #[test]
    fn test_unknown_source_rejected() {
        let dir = tempdir().unwrap();
        let config = AppConfig {
            source: "bloomberg".to_string(),
            ..AppConfig::with_db_path(dir.path().join("prices.duckdb"))
        };

        let err = AppState::new(config).err().unwrap();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }
}
