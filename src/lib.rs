//! SPIMEX SDK for Rust.
//!
//! Ingests the daily oil product trading reports published by the St.
//! Petersburg International Mercantile Exchange, stores them in DuckDB and
//! serves filtered views through a cache whose entries expire at a fixed
//! daily cutoff.
//!
//! # Quick start
//!
//! ```no_run
//! use spimex_sdk::SpimexSdk;
//!
//! let sdk = SpimexSdk::builder().build().unwrap();
//!
//! // Download, parse and store two trading days
//! sdk.ingest_and_store(&["11.09.2025", "12.09.2025"]).unwrap();
//!
//! // Query the three most recent trading dates
//! let dates = sdk.results().latest_dates(3).unwrap();
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod cache;
pub mod config;
pub mod connection;
pub mod error;
pub mod ingest;
pub mod models;
pub mod queries;
pub mod report;
pub mod sql_builder;

#[cfg(feature = "async")]
pub use async_client::AsyncSpimexSdk;
pub use cache::{CacheBackend, CacheLayer, MemoryBackend, RedisBackend};
pub use config::Settings;
pub use connection::Connection;
pub use error::{Result, SpimexError};
pub use ingest::{DateOutcome, Ingestor};
pub use models::{ReportRequest, ResultFilters, TradingResult};
pub use report::{ReportLayout, ReportSource};
pub use sql_builder::SqlBuilder;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveTime;
use tracing::info;

use report::HttpSource;

// ---------------------------------------------------------------------------
// SpimexSdkBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`SpimexSdk`] instance.
///
/// Use [`SpimexSdk::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](SpimexSdkBuilder::build) to create the SDK.
pub struct SpimexSdkBuilder {
    database_path: Option<PathBuf>,
    in_memory: bool,
    redis_url: Option<String>,
    cache_cutoff: NaiveTime,
    timeout: Duration,
    max_concurrency: usize,
    layout: ReportLayout,
    source: Option<Box<dyn ReportSource>>,
    cache: Option<CacheLayer>,
}

impl Default for SpimexSdkBuilder {
    fn default() -> Self {
        Self {
            database_path: None,
            in_memory: false,
            redis_url: None,
            cache_cutoff: config::default_cache_cutoff(),
            timeout: config::DEFAULT_TIMEOUT,
            max_concurrency: config::DEFAULT_MAX_CONCURRENCY,
            layout: ReportLayout::default(),
            source: None,
            cache: None,
        }
    }
}

impl SpimexSdkBuilder {
    /// Start from environment-derived [`Settings`].
    pub fn from_settings(settings: Settings) -> Self {
        let mut builder = Self {
            redis_url: settings.redis_url,
            cache_cutoff: settings.cache_cutoff,
            timeout: settings.timeout,
            max_concurrency: settings.max_concurrency,
            ..Self::default()
        };
        if let Some(path) = settings.database_path {
            builder = builder.database_path(path);
        }
        builder
    }

    /// Set the DuckDB database file.
    ///
    /// If not set, `spimex-sdk/spimex.duckdb` under the platform data
    /// directory is used. The path `:memory:` selects an in-memory database.
    pub fn database_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref();
        if path.as_os_str() == ":memory:" {
            self.in_memory = true;
            self.database_path = None;
        } else {
            self.in_memory = false;
            self.database_path = Some(path.to_path_buf());
        }
        self
    }

    /// Use an in-memory database that disappears with the SDK.
    pub fn in_memory(mut self) -> Self {
        self.in_memory = true;
        self.database_path = None;
        self
    }

    /// Cache query results in Redis at `url` instead of in process.
    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self
    }

    /// Local wall-clock time at which cached entries expire. Defaults to 14:11.
    pub fn cache_cutoff(mut self, cutoff: NaiveTime) -> Self {
        self.cache_cutoff = cutoff;
        self
    }

    /// Set the HTTP timeout for listing and report downloads.
    ///
    /// Defaults to 60 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Upper bound on concurrent report downloads. Defaults to 8.
    pub fn max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n.max(1);
        self
    }

    /// Override the site and spreadsheet layout.
    pub fn layout(mut self, layout: ReportLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Fetch listings and reports from `source` instead of the website.
    pub fn source(mut self, source: impl ReportSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Use a preconfigured cache; takes precedence over [`redis_url`](Self::redis_url).
    pub fn cache(mut self, cache: CacheLayer) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Build the SDK: open the database, create the schema and set up the
    /// cache. No network traffic happens until the first ingestion or cache
    /// operation.
    pub fn build(self) -> Result<SpimexSdk> {
        let conn = if self.in_memory {
            Connection::open_in_memory()?
        } else {
            let path = self
                .database_path
                .unwrap_or_else(config::default_database_path);
            Connection::open(path)?
        };

        let source: Box<dyn ReportSource> = match self.source {
            Some(source) => source,
            None => Box::new(HttpSource::new(self.timeout)?),
        };

        let cache = match (self.cache, self.redis_url) {
            (Some(cache), _) => cache,
            (None, Some(url)) => CacheLayer::redis(&url, self.cache_cutoff)?,
            (None, None) => CacheLayer::new(Box::new(MemoryBackend::new()), self.cache_cutoff),
        };

        info!(
            database = conn.location(),
            cache = cache.backend_name(),
            "SPIMEX SDK ready"
        );

        Ok(SpimexSdk {
            conn,
            cache,
            source,
            layout: self.layout,
            max_concurrency: self.max_concurrency,
        })
    }
}

// ---------------------------------------------------------------------------
// SpimexSdk
// ---------------------------------------------------------------------------

/// The main entry point for the SPIMEX SDK.
///
/// Owns the DuckDB [`Connection`], the [`CacheLayer`] and the
/// [`ReportSource`], and hands out borrowing query and ingestion interfaces.
///
/// Created via [`SpimexSdk::builder()`].
pub struct SpimexSdk {
    conn: Connection,
    cache: CacheLayer,
    source: Box<dyn ReportSource>,
    layout: ReportLayout,
    max_concurrency: usize,
}

impl SpimexSdk {
    /// Create a new builder for configuring the SDK.
    pub fn builder() -> SpimexSdkBuilder {
        SpimexSdkBuilder::default()
    }

    // -- Query accessors ---------------------------------------------------

    /// Access stored trading results through the cache.
    pub fn results(&self) -> queries::TradingResultQuery<'_> {
        queries::TradingResultQuery::with_cache(&self.conn, &self.cache)
    }

    /// Access stored trading results without touching the cache.
    pub fn results_uncached(&self) -> queries::TradingResultQuery<'_> {
        queries::TradingResultQuery::new(&self.conn)
    }

    // -- Ingestion ---------------------------------------------------------

    /// The report pipeline, configured with this SDK's source and layout.
    pub fn ingestor(&self) -> Ingestor<'_> {
        Ingestor::new(self.source.as_ref(), &self.layout).max_concurrency(self.max_concurrency)
    }

    /// Download and parse the reports for `dates` (`dd.mm.yyyy`) without
    /// storing them.
    ///
    /// Records are returned in the order of `dates`. Any failing day fails
    /// the whole call.
    pub fn fetch_reports<S: AsRef<str>>(&self, dates: &[S]) -> Result<Vec<TradingResult>> {
        let requests = parse_requests(dates)?;
        self.ingestor().ingest(&requests)
    }

    /// Download, parse and store the reports for `dates`.
    ///
    /// All-or-nothing: if any day fails, nothing is stored.
    pub fn ingest_and_store<S: AsRef<str>>(&self, dates: &[S]) -> Result<Vec<TradingResult>> {
        let records = self.fetch_reports(dates)?;
        self.conn.insert_results(&records)
    }

    /// Download and parse each day independently and store the days that
    /// succeeded. Returns every day's outcome, with stored records on success.
    pub fn ingest_each<S: AsRef<str>>(&self, dates: &[S]) -> Result<Vec<DateOutcome>> {
        let requests = parse_requests(dates)?;
        let mut outcomes = self.ingestor().ingest_each(&requests);
        for outcome in &mut outcomes {
            if let Ok(records) = &outcome.result {
                outcome.result = self.conn.insert_results(records);
            }
        }
        Ok(outcomes)
    }

    // -- Metadata and utility methods --------------------------------------

    /// Execute a raw SQL query against the DuckDB database.
    ///
    /// Provides escape-hatch access for queries not covered by
    /// [`results()`](Self::results).
    pub fn sql(
        &self,
        query: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        self.conn.execute(query, params)
    }

    /// Return a reference to the cache layer.
    pub fn cache(&self) -> &CacheLayer {
        &self.cache
    }

    /// Return a reference to the underlying [`Connection`] for advanced usage.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn layout(&self) -> &ReportLayout {
        &self.layout
    }

    /// Consume the SDK and release all resources.
    ///
    /// Closes the cache connection and the DuckDB database. Dropping the SDK
    /// has the same effect, minus the explicit cache close.
    pub fn close(self) {
        self.cache.close();
    }
}

fn parse_requests<S: AsRef<str>>(dates: &[S]) -> Result<Vec<ReportRequest>> {
    dates.iter().map(|d| ReportRequest::parse(d.as_ref())).collect()
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for SpimexSdk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SpimexSdk(database={}, cache={}, cutoff={}, max_concurrency={})",
            self.conn.location(),
            self.cache.backend_name(),
            self.cache.cutoff().format("%H:%M"),
            self.max_concurrency
        )
    }
}
