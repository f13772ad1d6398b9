//! DuckDB schema
//!
//! Every statement is `CREATE TABLE IF NOT EXISTS`, so applying the schema
//! on each start is safe. Existing tables are never altered: a shape change
//! has to be applied to the store by hand.

use crate::error::Result;
use duckdb::Connection;

/// Tables created by [`ensure_schema`], in creation order
pub const TABLES: [&str; 3] = ["prices", "events", "meta"];

/// Create any missing table
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    apply(conn, "prices", CREATE_PRICES)?;
    apply(conn, "events", CREATE_EVENTS)?;
    apply(conn, "meta", CREATE_META)?;

    tracing::info!("DuckDB schema ensured");
    Ok(())
}

fn apply(conn: &Connection, table: &str, sql: &str) -> Result<()> {
    if !table_exists(conn, table)? {
        tracing::info!("Creating table: {}", table);
    }
    conn.execute_batch(sql)?;
    Ok(())
}

/// Whether a table is present in the main schema
pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM information_schema.tables
         WHERE table_schema = 'main' AND table_name = ?",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists)
}

// "asof" is quoted because ASOF is a join keyword in DuckDB
const CREATE_PRICES: &str = r#"
CREATE TABLE IF NOT EXISTS prices (
    date DATE PRIMARY KEY,
    mstr_close DOUBLE,
    btc_usd_close DOUBLE,
    ibit_close DOUBLE,
    source VARCHAR,
    "asof" TIMESTAMP
);
"#;

const CREATE_EVENTS: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    date DATE,
    type VARCHAR,
    subtype VARCHAR,
    title VARCHAR,
    amount_usd DOUBLE,
    shares DOUBLE,
    coupon DOUBLE,
    conv_price DOUBLE,
    maturity DATE,
    source VARCHAR,
    notes VARCHAR,
    "asof" TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
"#;

const CREATE_META: &str = r#"
CREATE TABLE IF NOT EXISTS meta (
    key VARCHAR PRIMARY KEY,
    value VARCHAR,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_all_tables() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();

        for table in TABLES {
            assert!(table_exists(&conn, table).unwrap(), "missing {}", table);
        }
    }

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();

        conn.execute(
            "INSERT INTO meta (key, value) VALUES ('owner', 'me')",
            [],
        )
        .unwrap();

        // Second run must neither fail nor drop existing data
        ensure_schema(&conn).unwrap();

        let value: String = conn
            .query_row("SELECT value FROM meta WHERE key = 'owner'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(value, "me");
    }

    #[test]
    fn test_prices_date_is_primary_key() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();

        conn.execute("INSERT INTO prices (date) VALUES (DATE '2024-01-01')", [])
            .unwrap();
        let dup = conn.execute("INSERT INTO prices (date) VALUES (DATE '2024-01-01')", []);
        assert!(dup.is_err());
    }
}
