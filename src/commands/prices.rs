//! Price history command

use crate::config::AppConfig;
use crate::db::models::PriceColumn;
use crate::error::Result;
use crate::services::{PriceHistory, PriceService};

/// Summary of the stored price history
pub fn show_prices(config: &AppConfig) -> Result<String> {
    let history = PriceService::read_prices(config)?;
    Ok(summarize(&history))
}

fn summarize(history: &PriceHistory) -> String {
    let (first, last) = match (history.first(), history.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return "No prices stored yet.".to_string(),
    };

    let mut lines = vec![format!(
        "{} rows from {} to {}",
        history.len(),
        first.date,
        last.date
    )];

    for column in PriceColumn::ALL {
        let filled = history.iter().filter(|r| r.get(column).is_some()).count();
        let latest = history
            .iter()
            .rev()
            .find_map(|r| r.get(column).map(|v| (r.date, v)));

        lines.push(match latest {
            Some((date, value)) => format!(
                "  {:<14} {:>6} values, latest {:.2} on {}",
                column.as_str(),
                filled,
                value,
                date
            ),
            None => format!("  {:<14} {:>6} values", column.as_str(), filled),
        });
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::PriceRecord;
    use chrono::NaiveDate;

    #[test]
    fn test_summary_of_empty_history() {
        assert_eq!(summarize(&PriceHistory::default()), "No prices stored yet.");
    }

    #[test]
    fn test_summary_reports_latest_value_per_column() {
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let history = PriceHistory::from_records(vec![
            PriceRecord { date: d1, mstr_close: Some(68.8), btc_usd_close: Some(44000.0), ibit_close: None },
            PriceRecord { date: d2, mstr_close: None, btc_usd_close: Some(45000.0), ibit_close: None },
        ]);

        let summary = summarize(&history);
        assert!(summary.starts_with("2 rows from 2024-01-01 to 2024-01-02"));
        assert!(summary.contains("latest 68.80 on 2024-01-01"));
        assert!(summary.contains("latest 45000.00 on 2024-01-02"));
        assert!(summary.contains("ibit_close"));
    }
}
