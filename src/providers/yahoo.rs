//! Yahoo Finance chart API adapter

use crate::error::{AppError, Result};
use crate::providers::{DailyClose, PriceProvider};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, NaiveDate, Utc};
use chrono_tz::Tz;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) mstr-btc-db/0.1";

/// Yahoo Finance provider implementation
pub struct YahooProvider {
    client: Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .user_agent(USER_AGENT)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Unix seconds at 00:00 UTC of `date`
    fn epoch_seconds(date: NaiveDate) -> i64 {
        date.and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or_default()
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    exchange_timezone_name: Option<String>,
    #[serde(default)]
    gmtoffset: i32,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
    #[serde(default)]
    adjclose: Vec<AdjCloseBlock>,
}

#[derive(Debug, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseBlock {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

impl ChartMeta {
    /// Calendar date of a bar in the exchange's local time
    fn local_date(&self, timestamp: i64) -> Option<NaiveDate> {
        let utc = DateTime::<Utc>::from_timestamp(timestamp, 0)?;

        if let Some(tz) = self
            .exchange_timezone_name
            .as_deref()
            .and_then(|name| name.parse::<Tz>().ok())
        {
            return Some(utc.with_timezone(&tz).date_naive());
        }

        let offset = FixedOffset::east_opt(self.gmtoffset)?;
        Some(utc.with_timezone(&offset).date_naive())
    }
}

/// Turn a chart payload into adjusted daily closes clipped to `[start, end]`
fn parse_chart(
    envelope: ChartEnvelope,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DailyClose>> {
    if let Some(error) = envelope.chart.error {
        return Err(AppError::Provider(format!(
            "{}: {} ({})",
            symbol,
            error.description.unwrap_or_else(|| "unknown error".to_string()),
            error.code.unwrap_or_default()
        )));
    }

    let result = match envelope.chart.result.and_then(|r| r.into_iter().next()) {
        Some(result) => result,
        None => return Ok(vec![]),
    };

    // Adjusted closes when present, raw closes otherwise
    let closes: &[Option<f64>] = match result.indicators.adjclose.first() {
        Some(block) if !block.adjclose.is_empty() => block.adjclose.as_slice(),
        _ => result
            .indicators
            .quote
            .first()
            .map(|q| q.close.as_slice())
            .unwrap_or(&[]),
    };

    // Keyed by date so a duplicate bar (e.g. a live intraday bar) keeps the last value
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for (ts, close) in result.timestamp.iter().zip(closes.iter()) {
        let (Some(date), Some(close)) = (result.meta.local_date(*ts), close) else {
            continue;
        };
        if date < start || date > end || !close.is_finite() {
            continue;
        }
        by_date.insert(date, *close);
    }

    Ok(by_date
        .into_iter()
        .map(|(date, close)| DailyClose { date, close })
        .collect())
}

#[async_trait]
impl PriceProvider for YahooProvider {
    fn id(&self) -> &'static str {
        "yahoo"
    }

    fn name(&self) -> &'static str {
        "Yahoo Finance"
    }

    async fn fetch_daily_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyClose>> {
        if start > end {
            return Ok(vec![]);
        }

        // period2 is exclusive, so ask up to the following midnight
        let period1 = Self::epoch_seconds(start);
        let period2 = Self::epoch_seconds(end + ChronoDuration::days(1));

        let url = format!("{}/{}", self.base_url, symbol);
        tracing::debug!("GET {} period1={} period2={}", url, period1, period2);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "div|split".to_string()),
                ("includeAdjustedClose", "true".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        // Yahoo reports unknown symbols as a 404 carrying a chart error body
        let envelope: ChartEnvelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => return Err(e.into()),
            Err(_) => {
                return Err(AppError::Provider(format!(
                    "{}: HTTP {}",
                    symbol, status
                )))
            }
        };

        parse_chart(envelope, symbol, start, end)
    }
}
