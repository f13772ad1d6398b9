//! Market-data provider adapters

pub mod yahoo;

use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Adjusted closing price for one calendar date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub close: f64,
}

/// Provider trait that all market-data sources must implement
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Provider ID, also the `source` label stamped on stored rows
    fn id(&self) -> &'static str;

    /// Provider display name
    fn name(&self) -> &'static str;

    /// Daily split/dividend-adjusted closes for `symbol` within
    /// `[start, end]`, both inclusive, ascending and unique by date.
    ///
    /// Dates are calendar dates without time-of-day or timezone.
    async fn fetch_daily_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyClose>>;
}

/// Provider registry keyed by provider ID
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn PriceProvider>>,
}

impl ProviderRegistry {
    /// Create new registry with all supported providers
    pub fn new(timeout: Duration) -> Self {
        let mut providers: HashMap<String, Arc<dyn PriceProvider>> = HashMap::new();

        let yahoo = yahoo::YahooProvider::with_timeout(timeout);
        providers.insert(yahoo.id().to_string(), Arc::new(yahoo));

        Self { providers }
    }

    /// Get provider by ID
    pub fn get(&self, id: &str) -> Option<Arc<dyn PriceProvider>> {
        self.providers.get(id).cloned()
    }

    /// List all available providers
    pub fn list(&self) -> Vec<Arc<dyn PriceProvider>> {
        self.providers.values().cloned().collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}
