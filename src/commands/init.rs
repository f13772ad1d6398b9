//! Schema initialization command

use crate::config::AppConfig;
use crate::error::Result;
use crate::state::open_store;

/// Create the store and any missing table
pub fn init_db(config: &AppConfig) -> Result<String> {
    let db = open_store(config)?;
    db.ensure_schema()?;

    Ok(format!("Initialized full schema at {}", config.db_path.display()))
}
