//! Statements over the `prices` table

use crate::config::UpsertMode;
use crate::db::models::{PriceColumn, PriceRecord, PriceRow};
use crate::error::{AppError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use duckdb::Connection;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Latest stored date, `None` when the table is empty
pub fn max_date(conn: &Connection) -> Result<Option<NaiveDate>> {
    let max: Option<String> = conn.query_row(
        "SELECT CAST(MAX(date) AS VARCHAR) FROM prices",
        [],
        |row| row.get(0),
    )?;

    max.as_deref().map(parse_date).transpose()
}

pub fn count_prices(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM prices", [], |row| row.get(0))?;
    Ok(count)
}

/// Write `rows` keyed on `date` inside one transaction.
///
/// With [`UpsertMode::ReplaceRow`] a stored row is replaced as a whole, so
/// value columns absent from `fetched` end up null. With
/// [`UpsertMode::MergeColumns`] only the `fetched` columns, `source` and
/// `asof` of a stored row are overwritten.
pub fn upsert_prices(
    conn: &mut Connection,
    rows: &[PriceRow],
    mode: UpsertMode,
    fetched: &[PriceColumn],
) -> Result<usize> {
    let sql = upsert_statement(mode, fetched);
    let tx = conn.transaction()?;

    let mut stmt = tx.prepare(&sql)?;

    let mut count = 0;
    for row in rows {
        stmt.execute(duckdb::params![
            row.date.format(DATE_FORMAT).to_string(),
            row.mstr_close,
            row.btc_usd_close,
            row.ibit_close,
            row.source,
            format_timestamp(&row.asof),
        ])?;
        count += 1;
    }

    drop(stmt);
    tx.commit()?;

    Ok(count)
}

fn upsert_statement(mode: UpsertMode, fetched: &[PriceColumn]) -> String {
    const VALUES: &str = r#"(date, mstr_close, btc_usd_close, ibit_close, source, "asof")
         VALUES (CAST(? AS DATE), ?, ?, ?, ?, CAST(? AS TIMESTAMP))"#;

    match mode {
        UpsertMode::ReplaceRow => format!("INSERT OR REPLACE INTO prices {}", VALUES),
        UpsertMode::MergeColumns => {
            let mut updates: Vec<String> = PriceColumn::ALL
                .iter()
                .filter(|c| fetched.contains(c))
                .map(|c| format!("{0} = excluded.{0}", c.as_str()))
                .collect();
            updates.push("source = excluded.source".to_string());
            updates.push(r#""asof" = excluded."asof""#.to_string());

            format!(
                "INSERT INTO prices {} ON CONFLICT (date) DO UPDATE SET {}",
                VALUES,
                updates.join(", ")
            )
        }
    }
}

/// Date and closing prices, ascending by date
pub fn load_prices(conn: &Connection) -> Result<Vec<PriceRecord>> {
    let mut stmt = conn.prepare(
        "SELECT CAST(date AS VARCHAR), mstr_close, btc_usd_close, ibit_close
         FROM prices
         ORDER BY date ASC",
    )?;

    let raw = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<f64>>(1)?,
                row.get::<_, Option<f64>>(2)?,
                row.get::<_, Option<f64>>(3)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    raw.into_iter()
        .map(|(date, mstr_close, btc_usd_close, ibit_close)| {
            Ok(PriceRecord {
                date: parse_date(&date)?,
                mstr_close,
                btc_usd_close,
                ibit_close,
            })
        })
        .collect()
}

/// Complete stored rows including `source` and `asof`, ascending by date
pub fn load_rows(conn: &Connection) -> Result<Vec<PriceRow>> {
    let mut stmt = conn.prepare(
        r#"SELECT CAST(date AS VARCHAR), mstr_close, btc_usd_close, ibit_close,
                  source, CAST("asof" AS VARCHAR)
           FROM prices
           ORDER BY date ASC"#,
    )?;

    let raw = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<f64>>(1)?,
                row.get::<_, Option<f64>>(2)?,
                row.get::<_, Option<f64>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    raw.into_iter()
        .map(|(date, mstr_close, btc_usd_close, ibit_close, source, asof)| {
            let asof = asof.ok_or_else(|| {
                AppError::Validation(format!("row {} has no asof timestamp", date))
            })?;
            Ok(PriceRow {
                date: parse_date(&date)?,
                mstr_close,
                btc_usd_close,
                ibit_close,
                source: source.unwrap_or_default(),
                asof: parse_timestamp(&asof)?,
            })
        })
        .collect()
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| AppError::Validation(format!("invalid stored date '{}': {}", value, e)))
}

fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.naive_utc().format(TIMESTAMP_FORMAT).to_string()
}

// Stored timestamps are naive UTC
fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| AppError::Validation(format!("invalid stored timestamp '{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema;
    use chrono::TimeZone;

    fn create_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        schema::ensure_schema(&conn).unwrap();
        conn
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn row(d: &str, mstr: Option<f64>, btc: Option<f64>, asof: DateTime<Utc>) -> PriceRow {
        PriceRow {
            mstr_close: mstr,
            btc_usd_close: btc,
            ..PriceRow::empty(date(d), "yahoo", asof)
        }
    }

    #[test]
    fn test_max_date_empty_table() {
        let conn = create_test_db();
        assert_eq!(max_date(&conn).unwrap(), None);
    }

    #[test]
    fn test_upsert_and_load() {
        let mut conn = create_test_db();
        let asof = Utc.with_ymd_and_hms(2024, 1, 3, 12, 30, 0).unwrap();
        let rows = vec![
            row("2024-01-02", Some(70.5), Some(45000.0), asof),
            row("2024-01-01", None, Some(44000.0), asof),
        ];

        let written = upsert_prices(&mut conn, &rows, UpsertMode::ReplaceRow, &PriceColumn::ALL).unwrap();
        assert_eq!(written, 2);
        assert_eq!(max_date(&conn).unwrap(), Some(date("2024-01-02")));

        let loaded = load_prices(&conn).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].date, date("2024-01-01"));
        assert_eq!(loaded[0].mstr_close, None);
        assert_eq!(loaded[1].btc_usd_close, Some(45000.0));

        let full = load_rows(&conn).unwrap();
        assert_eq!(full[1].asof, asof);
        assert_eq!(full[1].source, "yahoo");
    }

    #[test]
    fn test_replace_row_nulls_unfetched_columns() {
        let mut conn = create_test_db();
        let first = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap();

        upsert_prices(
            &mut conn,
            &[row("2024-01-01", Some(100.0), Some(50000.0), first)],
            UpsertMode::ReplaceRow,
            &PriceColumn::ALL,
        )
        .unwrap();

        upsert_prices(
            &mut conn,
            &[row("2024-01-01", None, Some(51000.0), second)],
            UpsertMode::ReplaceRow,
            &[PriceColumn::BtcUsdClose],
        )
        .unwrap();

        let rows = load_rows(&conn).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].mstr_close, None);
        assert_eq!(rows[0].btc_usd_close, Some(51000.0));
        assert_eq!(rows[0].asof, second);
    }

    #[test]
    fn test_merge_columns_keeps_unfetched_columns() {
        let mut conn = create_test_db();
        let first = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap();

        upsert_prices(
            &mut conn,
            &[row("2024-01-01", Some(100.0), Some(50000.0), first)],
            UpsertMode::MergeColumns,
            &PriceColumn::ALL,
        )
        .unwrap();

        upsert_prices(
            &mut conn,
            &[
                row("2024-01-01", None, Some(51000.0), second),
                row("2024-01-02", None, Some(52000.0), second),
            ],
            UpsertMode::MergeColumns,
            &[PriceColumn::BtcUsdClose],
        )
        .unwrap();

        let rows = load_rows(&conn).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].mstr_close, Some(100.0));
        assert_eq!(rows[0].btc_usd_close, Some(51000.0));
        assert_eq!(rows[0].asof, second);
        assert_eq!(rows[1].mstr_close, None);
        assert_eq!(count_prices(&conn).unwrap(), 2);
    }

    #[test]
    fn test_merge_statement_lists_only_fetched_columns() {
        let sql = upsert_statement(UpsertMode::MergeColumns, &[PriceColumn::IbitClose]);
        assert!(sql.contains("ibit_close = excluded.ibit_close"));
        assert!(!sql.contains("mstr_close = excluded"));
        assert!(sql.contains("ON CONFLICT (date)"));
    }

    #[test]
    fn test_timestamp_round_trip_without_fraction() {
        let parsed = parse_timestamp("2024-05-06 07:08:09").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap());
    }
}
