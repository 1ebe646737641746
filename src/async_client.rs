//! Async wrapper around [`SpimexSdk`] for use in async runtimes (Tokio, etc.).
//!
//! Runs all SDK operations on a blocking thread pool via
//! [`tokio::task::spawn_blocking`], keeping the async event loop free.
//! Report downloads and DuckDB queries both block, so every call goes
//! through the pool.
//!
//! # Example
//!
//! ```no_run
//! use spimex_sdk::{AsyncSpimexSdk, ResultFilters};
//!
//! #[tokio::main]
//! async fn main() {
//!     let sdk = AsyncSpimexSdk::builder().build().await.unwrap();
//!
//!     // Ingest two trading days
//!     sdk.ingest_and_store(vec!["11.09.2025".into(), "12.09.2025".into()])
//!         .await
//!         .unwrap();
//!
//!     // Run any sync SDK method via closure
//!     let latest = sdk
//!         .run(|s| s.results().trading_results(Some(10), &ResultFilters::oil("A592")))
//!         .await
//!         .unwrap();
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};

use crate::error::{Result, SpimexError};
use crate::models::{ResultFilters, TradingResult};
use crate::{CacheLayer, ReportSource, Settings, SpimexSdk, SpimexSdkBuilder};

// ---------------------------------------------------------------------------
// AsyncSpimexSdkBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`AsyncSpimexSdk`] instance.
///
/// Mirrors [`SpimexSdkBuilder`]; configuration is applied when
/// [`build()`](Self::build) runs on the blocking pool.
#[derive(Default)]
pub struct AsyncSpimexSdkBuilder {
    inner: SpimexSdkBuilder,
}

impl AsyncSpimexSdkBuilder {
    /// Start from environment-derived [`Settings`].
    pub fn from_settings(settings: Settings) -> Self {
        Self {
            inner: SpimexSdkBuilder::from_settings(settings),
        }
    }

    /// Set the DuckDB database file (`:memory:` for an in-memory database).
    pub fn database_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path: PathBuf = path.as_ref().to_path_buf();
        self.inner = self.inner.database_path(path);
        self
    }

    /// Use an in-memory database.
    pub fn in_memory(mut self) -> Self {
        self.inner = self.inner.in_memory();
        self
    }

    /// Cache query results in Redis at `url`.
    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.inner = self.inner.redis_url(url);
        self
    }

    pub fn cache_cutoff(mut self, cutoff: NaiveTime) -> Self {
        self.inner = self.inner.cache_cutoff(cutoff);
        self
    }

    /// Set the HTTP request timeout for report downloads.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.timeout(timeout);
        self
    }

    pub fn max_concurrency(mut self, n: usize) -> Self {
        self.inner = self.inner.max_concurrency(n);
        self
    }

    /// Fetch listings and reports from `source` instead of the website.
    pub fn source(mut self, source: impl ReportSource + 'static) -> Self {
        self.inner = self.inner.source(source);
        self
    }

    pub fn cache(mut self, cache: CacheLayer) -> Self {
        self.inner = self.inner.cache(cache);
        self
    }

    /// Build the async SDK, opening the database and the cache.
    ///
    /// Initialization runs on the blocking thread pool so it won't block
    /// the async event loop.
    pub async fn build(self) -> Result<AsyncSpimexSdk> {
        let inner = self.inner;
        tokio::task::spawn_blocking(move || {
            let sdk = inner.build()?;
            Ok(AsyncSpimexSdk {
                inner: Arc::new(Mutex::new(sdk)),
            })
        })
        .await
        .map_err(|e| SpimexError::InvalidArgument(format!("Task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// AsyncSpimexSdk
// ---------------------------------------------------------------------------

/// Async wrapper around [`SpimexSdk`].
///
/// All operations are dispatched to a blocking thread pool via
/// [`tokio::task::spawn_blocking`]. The underlying [`SpimexSdk`] is
/// protected by a [`Mutex`] since its DuckDB connection is not `Sync`.
///
/// Cloning is cheap and shares the same SDK.
#[derive(Clone)]
pub struct AsyncSpimexSdk {
    inner: Arc<Mutex<SpimexSdk>>,
}

impl AsyncSpimexSdk {
    /// Create a new builder for configuring the async SDK.
    pub fn builder() -> AsyncSpimexSdkBuilder {
        AsyncSpimexSdkBuilder::default()
    }

    /// Run a sync SDK operation on the blocking thread pool.
    ///
    /// The closure receives an `&SpimexSdk` reference and should return
    /// a `Result<T>`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use spimex_sdk::AsyncSpimexSdk;
    /// # async fn example() -> spimex_sdk::Result<()> {
    /// # let sdk = AsyncSpimexSdk::builder().build().await?;
    /// let rows = sdk.run(|s| s.connection().count_results()).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&SpimexSdk) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sdk = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = sdk
                .lock()
                .map_err(|_| SpimexError::InvalidArgument("SDK lock poisoned".into()))?;
            f(&guard)
        })
        .await
        .map_err(|e| SpimexError::InvalidArgument(format!("Task join error: {e}")))?
    }

    /// Download, parse and store the reports for `dates` (`dd.mm.yyyy`).
    pub async fn ingest_and_store(&self, dates: Vec<String>) -> Result<Vec<TradingResult>> {
        self.run(move |s| s.ingest_and_store(dates.as_slice())).await
    }

    /// Every stored trading result.
    pub async fn all(&self) -> Result<Vec<TradingResult>> {
        self.run(|s| s.results().all()).await
    }

    /// The `limit` most recent distinct trading dates.
    pub async fn latest_dates(&self, limit: usize) -> Result<Vec<NaiveDate>> {
        self.run(move |s| s.results().latest_dates(limit)).await
    }

    /// Results within `[start, end]` matching `filters`.
    pub async fn dynamics(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        filters: ResultFilters,
    ) -> Result<Vec<TradingResult>> {
        self.run(move |s| s.results().dynamics(start, end, &filters))
            .await
    }

    /// The most recent results matching `filters`.
    pub async fn trading_results(
        &self,
        limit: Option<usize>,
        filters: ResultFilters,
    ) -> Result<Vec<TradingResult>> {
        self.run(move |s| s.results().trading_results(limit, &filters))
            .await
    }

    /// Execute a raw SQL query asynchronously.
    ///
    /// Convenience wrapper around [`run()`](Self::run) for
    /// [`SpimexSdk::sql()`].
    pub async fn sql(
        &self,
        query: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        let query = query.to_string();
        let params = params.to_vec();
        self.run(move |s| s.sql(&query, &params)).await
    }

    /// Drop every cached query result.
    pub async fn flush_cache(&self) -> Result<()> {
        self.run(|s| s.cache().flush()).await
    }

    /// Close the SDK, releasing all resources.
    ///
    /// Closes the cache connection. The database is closed once the last
    /// clone of this handle is dropped.
    pub async fn close(self) -> Result<()> {
        self.run(|s| {
            s.cache().close();
            Ok(())
        })
        .await
    }
}
