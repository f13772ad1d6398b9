//! Price update command

use crate::error::Result;
use crate::services::{SyncOutcome, SyncService};
use crate::state::AppState;

/// Fetch and upsert every date after the latest stored one
pub async fn update_prices(state: &AppState) -> Result<SyncOutcome> {
    tracing::info!(
        "Updating prices from {} for {} series",
        state.provider.name(),
        state.config.active_series().count()
    );

    SyncService::sync(&state.db, &*state.provider, &state.config).await
}
