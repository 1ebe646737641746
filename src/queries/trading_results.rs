//! Trading result queries with read-through caching.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::cache::CacheLayer;
use crate::config::RESULTS_TABLE;
use crate::connection::Connection;
use crate::error::Result;
use crate::models::{ResultFilters, TradingResult};
use crate::queries::descriptor::{self, QueryDescriptor};

#[derive(serde::Deserialize)]
struct DateRow {
    date: NaiveDate,
}

/// Query interface over stored trading results.
///
/// When a [`CacheLayer`] is attached, non-empty results are cached under a
/// key derived from the query parameters and served from the cache until the
/// daily cutoff. A failing cache is logged and bypassed.
pub struct TradingResultQuery<'a> {
    conn: &'a Connection,
    cache: Option<&'a CacheLayer>,
}

impl<'a> TradingResultQuery<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn, cache: None }
    }

    pub fn with_cache(conn: &'a Connection, cache: &'a CacheLayer) -> Self {
        Self {
            conn,
            cache: Some(cache),
        }
    }

    /// Every stored trading result.
    pub fn all(&self) -> Result<Vec<TradingResult>> {
        self.cached_records(&descriptor::all_key(), &descriptor::all())
    }

    /// The `limit` most recent distinct trading dates, newest first.
    pub fn latest_dates(&self, limit: usize) -> Result<Vec<NaiveDate>> {
        let key = descriptor::latest_dates_key(limit);
        self.read_through(
            &key,
            || {
                let (sql, params) = descriptor::latest_dates(limit).to_sql(RESULTS_TABLE);
                let rows: Vec<DateRow> = self.conn.execute_into(&sql, &params)?;
                Ok(rows.into_iter().map(|r| r.date).collect())
            },
            |cache, dates| cache.set(&key, dates),
        )
    }

    /// Results dated within `[start, end]` (inclusive), narrowed by `filters`.
    pub fn dynamics(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        filters: &ResultFilters,
    ) -> Result<Vec<TradingResult>> {
        self.cached_records(
            &descriptor::dynamics_key(start, end, filters),
            &descriptor::dynamics(start, end, filters),
        )
    }

    /// The most recent results matching `filters`, newest first.
    ///
    /// `limit` defaults to [`descriptor::DEFAULT_RESULTS_LIMIT`].
    pub fn trading_results(
        &self,
        limit: Option<usize>,
        filters: &ResultFilters,
    ) -> Result<Vec<TradingResult>> {
        self.cached_records(
            &descriptor::trading_results_key(limit, filters),
            &descriptor::trading_results(limit, filters),
        )
    }

    /// Run a descriptor against storage, bypassing the cache.
    pub fn fetch(&self, query: &QueryDescriptor) -> Result<Vec<TradingResult>> {
        let (sql, params) = query.to_sql(RESULTS_TABLE);
        self.conn.execute_into(&sql, &params)
    }

    fn cached_records(&self, key: &str, query: &QueryDescriptor) -> Result<Vec<TradingResult>> {
        self.read_through(key, || self.fetch(query), |cache, rows| cache.set_records(key, rows))
    }

    fn read_through<T, Q, S>(&self, key: &str, query: Q, store: S) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        Q: FnOnce() -> Result<Vec<T>>,
        S: FnOnce(&CacheLayer, &[T]) -> Result<()>,
    {
        if let Some(cache) = self.cache {
            match cache.get_as::<Vec<T>>(key) {
                Ok(Some(hit)) if !hit.is_empty() => {
                    debug!(key, rows = hit.len(), "cache hit");
                    return Ok(hit);
                }
                Ok(_) => debug!(key, "cache miss"),
                Err(e) => warn!(key, error = %e, "cache read failed; querying storage"),
            }
        }

        let rows = query()?;

        // Empty results are never cached.
        if let Some(cache) = self.cache.filter(|_| !rows.is_empty()) {
            if let Err(e) = store(cache, &rows) {
                warn!(key, error = %e, "cache write failed");
            }
        }
        Ok(rows)
    }
}
