use std::env;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveTime;

use crate::error::{Result, SpimexError};

pub const SITE_ORIGIN: &str = "https://spimex.com";
pub const LISTING_URL: &str = "https://spimex.com/markets/oil_products/trades/results/";

/// Table holding persisted trading results.
pub const RESULTS_TABLE: &str = "spimex_trading_results";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Daily publication cutoff; cache entries expire at this local time.
pub fn default_cache_cutoff() -> NaiveTime {
    NaiveTime::from_hms_opt(14, 11, 0).unwrap_or(NaiveTime::MIN)
}

pub fn default_database_path() -> PathBuf {
    if let Some(data) = dirs::data_dir() {
        data.join("spimex-sdk").join("spimex.duckdb")
    } else {
        PathBuf::from(".spimex-sdk").join("spimex.duckdb")
    }
}

/// Settings read from the process environment.
///
/// | Variable | Meaning |
/// |---|---|
/// | `SPIMEX_DB_PATH` | DuckDB file (`:memory:` for an in-memory database) |
/// | `SPIMEX_REDIS_URL` | Redis connection URL; unset means in-process cache |
/// | `SPIMEX_CACHE_CUTOFF` | Daily cache cutoff as `HH:MM` |
/// | `SPIMEX_HTTP_TIMEOUT_SECS` | Timeout for listing and report downloads |
/// | `SPIMEX_MAX_CONCURRENCY` | Upper bound on concurrent report downloads |
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_path: Option<PathBuf>,
    pub redis_url: Option<String>,
    pub cache_cutoff: NaiveTime,
    pub timeout: Duration,
    pub max_concurrency: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: None,
            redis_url: None,
            cache_cutoff: default_cache_cutoff(),
            timeout: DEFAULT_TIMEOUT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(path) = lookup("SPIMEX_DB_PATH") {
            settings.database_path = Some(PathBuf::from(path));
        }
        settings.redis_url = lookup("SPIMEX_REDIS_URL").filter(|u| !u.trim().is_empty());

        if let Some(raw) = lookup("SPIMEX_CACHE_CUTOFF") {
            settings.cache_cutoff = NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|e| {
                SpimexError::InvalidArgument(format!("SPIMEX_CACHE_CUTOFF={raw}: {e}"))
            })?;
        }
        if let Some(raw) = lookup("SPIMEX_HTTP_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                SpimexError::InvalidArgument(format!("SPIMEX_HTTP_TIMEOUT_SECS={raw}"))
            })?;
            settings.timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = lookup("SPIMEX_MAX_CONCURRENCY") {
            let n: usize = raw.trim().parse().map_err(|_| {
                SpimexError::InvalidArgument(format!("SPIMEX_MAX_CONCURRENCY={raw}"))
            })?;
            if n == 0 {
                return Err(SpimexError::InvalidArgument(
                    "SPIMEX_MAX_CONCURRENCY must be at least 1".into(),
                ));
            }
            settings.max_concurrency = n;
        }

        Ok(settings)
    }
}
