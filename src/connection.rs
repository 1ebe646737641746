//! DuckDB storage for trading results.
//!
//! Owns the `spimex_trading_results` table: creates the schema on open,
//! bulk-inserts records (assigning `id`, `created_on`, `updated_on`) and
//! executes parameterised queries, converting rows to JSON values.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use duckdb::types::{TimeUnit, ValueRef};
use duckdb::Connection as DuckDbConnection;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::RESULTS_TABLE;
use crate::error::{Result, SpimexError};
use crate::models::TradingResult;

const ID_SEQUENCE: &str = "spimex_trading_results_id_seq";

/// Wraps a DuckDB connection holding the trading results table.
pub struct Connection {
    conn: DuckDbConnection,
    location: String,
}

impl Connection {
    /// Open an in-memory database with the schema in place.
    pub fn open_in_memory() -> Result<Self> {
        let conn = DuckDbConnection::open_in_memory()?;
        Self::init(conn, ":memory:".to_string())
    }

    /// Open (or create) a database file with the schema in place.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let conn = DuckDbConnection::open(path)?;
        Self::init(conn, path.display().to_string())
    }

    fn init(conn: DuckDbConnection, location: String) -> Result<Self> {
        let this = Self { conn, location };
        this.ensure_schema()?;
        Ok(this)
    }

    /// Create the results table and its id sequence if missing.
    pub fn ensure_schema(&self) -> Result<()> {
        self.conn.execute_batch(&format!(
            "CREATE SEQUENCE IF NOT EXISTS {ID_SEQUENCE} START 1;
             CREATE TABLE IF NOT EXISTS {RESULTS_TABLE} (
                 id BIGINT PRIMARY KEY,
                 exchange_product_id VARCHAR NOT NULL,
                 exchange_product_name VARCHAR NOT NULL,
                 oil_id VARCHAR NOT NULL,
                 delivery_basis_id VARCHAR NOT NULL,
                 delivery_basis_name VARCHAR NOT NULL,
                 delivery_type_id VARCHAR NOT NULL,
                 volume BIGINT,
                 total DECIMAL(18, 2),
                 count BIGINT,
                 date DATE NOT NULL,
                 created_on TIMESTAMP NOT NULL,
                 updated_on TIMESTAMP NOT NULL
             );"
        ))?;
        info!(location = %self.location, "schema ready");
        Ok(())
    }

    /// Where the database lives (`:memory:` for in-memory databases).
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Insert records in one transaction and return them as stored.
    ///
    /// Records are expected to come from [`TradingResult::new`], which
    /// derives the oil, basis and delivery-type codes from the product code.
    /// The stored codes are taken as given and not re-derived here.
    ///
    /// Records without an `id` draw one from the table's sequence; missing
    /// timestamps are set to the current local time. Either every record is
    /// stored or none is.
    pub fn insert_results(&self, records: &[TradingResult]) -> Result<Vec<TradingResult>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        self.conn.execute_batch("BEGIN TRANSACTION")?;
        match self.insert_all(records) {
            Ok(stored) => {
                self.conn.execute_batch("COMMIT")?;
                info!(rows = stored.len(), "stored trading results");
                Ok(stored)
            }
            Err(e) => {
                self.conn.execute_batch("ROLLBACK")?;
                Err(e)
            }
        }
    }

    fn insert_all(&self, records: &[TradingResult]) -> Result<Vec<TradingResult>> {
        let now = Local::now().naive_local();
        let mut next_id = self
            .conn
            .prepare(&format!("SELECT nextval('{ID_SEQUENCE}')"))?;
        let mut insert = self.conn.prepare(&format!(
            "INSERT INTO {RESULTS_TABLE} (
                 id, exchange_product_id, exchange_product_name, oil_id,
                 delivery_basis_id, delivery_basis_name, delivery_type_id,
                 volume, total, count, date, created_on, updated_on
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, CAST(? AS DECIMAL(18, 2)), ?,
                       CAST(? AS DATE), CAST(? AS TIMESTAMP), CAST(? AS TIMESTAMP))"
        ))?;

        let mut stored = Vec::with_capacity(records.len());
        for record in records {
            let id = match record.id {
                Some(id) => id,
                None => next_id.query_row([], |row| row.get::<_, i64>(0))?,
            };
            let created_on = record.created_on.unwrap_or(now);
            let updated_on = record.updated_on.unwrap_or(created_on);

            insert.execute(duckdb::params![
                id,
                record.exchange_product_id,
                record.exchange_product_name,
                record.oil_id,
                record.delivery_basis_id,
                record.delivery_basis_name,
                record.delivery_type_id,
                record.volume,
                record.total.map(|t| t.to_string()),
                record.count,
                record.date.to_string(),
                timestamp_param(created_on),
                timestamp_param(updated_on),
            ])?;

            stored.push(TradingResult {
                id: Some(id),
                created_on: Some(created_on),
                updated_on: Some(updated_on),
                ..record.clone()
            });
        }
        Ok(stored)
    }

    /// Execute SQL and return results as a `Vec` of `HashMap`s.
    ///
    /// Dates come back as `YYYY-MM-DD` strings, timestamps as ISO-8601
    /// strings and decimals as exact strings.
    pub fn execute(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        let mut stmt = self.conn.prepare(sql)?;

        let param_values: Vec<&dyn duckdb::ToSql> = params
            .iter()
            .map(|p| p as &dyn duckdb::ToSql)
            .collect();

        let mut rows_result = stmt.query(param_values.as_slice())?;

        // Column metadata is only available once the query has run.
        let executed = rows_result
            .as_ref()
            .ok_or_else(|| SpimexError::NotFound("statement metadata".into()))?;
        let column_names: Vec<String> = executed
            .column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();

        let mut out: Vec<HashMap<String, serde_json::Value>> = Vec::new();

        while let Some(row) = rows_result.next()? {
            let mut map = HashMap::with_capacity(column_names.len());
            for (i, col_name) in column_names.iter().enumerate() {
                map.insert(col_name.clone(), convert_value_ref(row.get_ref(i)?));
            }
            out.push(map);
        }

        debug!(rows = out.len(), "query executed");
        Ok(out)
    }

    /// Execute SQL and deserialize each row into type `T`.
    pub fn execute_into<T: DeserializeOwned>(&self, sql: &str, params: &[String]) -> Result<Vec<T>> {
        let rows = self.execute(sql, params)?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let value = serde_json::Value::Object(row.into_iter().collect());
            results.push(serde_json::from_value(value)?);
        }
        Ok(results)
    }

    /// Execute SQL and return the first column of the first row.
    ///
    /// Returns `None` if the result set is empty.
    pub fn execute_scalar(&self, sql: &str, params: &[String]) -> Result<Option<serde_json::Value>> {
        let mut stmt = self.conn.prepare(sql)?;
        let param_values: Vec<&dyn duckdb::ToSql> = params
            .iter()
            .map(|p| p as &dyn duckdb::ToSql)
            .collect();

        let mut rows = stmt.query(param_values.as_slice())?;

        if let Some(row) = rows.next()? {
            Ok(Some(convert_value_ref(row.get_ref(0)?)))
        } else {
            Ok(None)
        }
    }

    /// Number of stored trading results.
    pub fn count_results(&self) -> Result<i64> {
        let value = self.execute_scalar(&format!("SELECT COUNT(*) FROM {RESULTS_TABLE}"), &[])?;
        Ok(value.and_then(|v| v.as_i64()).unwrap_or(0))
    }

    /// Access the underlying DuckDB connection for advanced usage.
    pub fn raw(&self) -> &DuckDbConnection {
        &self.conn
    }
}

fn timestamp_param(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()
}

/// Convert a DuckDB `ValueRef` to a `serde_json::Value`.
fn convert_value_ref(val: ValueRef<'_>) -> serde_json::Value {
    use serde_json::Value;

    match val {
        ValueRef::Null => Value::Null,
        ValueRef::Boolean(b) => Value::Bool(b),
        ValueRef::TinyInt(n) => Value::Number(n.into()),
        ValueRef::SmallInt(n) => Value::Number(n.into()),
        ValueRef::Int(n) => Value::Number(n.into()),
        ValueRef::BigInt(n) => Value::Number(n.into()),
        ValueRef::HugeInt(n) => match i64::try_from(n) {
            Ok(i) => Value::Number(i.into()),
            Err(_) => Value::String(n.to_string()),
        },
        ValueRef::UTinyInt(n) => Value::Number(n.into()),
        ValueRef::USmallInt(n) => Value::Number(n.into()),
        ValueRef::UInt(n) => Value::Number(n.into()),
        ValueRef::UBigInt(n) => Value::Number(n.into()),
        ValueRef::Float(f) => serde_json::Number::from_f64(f as f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Double(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Decimal(d) => Value::String(d.to_string()),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).to_string()),
        ValueRef::Date32(days) => NaiveDate::from_ymd_opt(1970, 1, 1)
            .and_then(|epoch| epoch.checked_add_signed(chrono::Duration::days(i64::from(days))))
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null),
        ValueRef::Timestamp(unit, v) => {
            let micros = match unit {
                TimeUnit::Second => v.saturating_mul(1_000_000),
                TimeUnit::Millisecond => v.saturating_mul(1_000),
                TimeUnit::Microsecond => v,
                TimeUnit::Nanosecond => v / 1_000,
            };
            DateTime::from_timestamp_micros(micros)
                .map(|dt| serde_json::to_value(dt.naive_utc()).unwrap_or(Value::Null))
                .unwrap_or(Value::Null)
        }
        _ => Value::Null,
    }
}
