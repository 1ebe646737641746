//! Read-through cache with a daily cutoff expiry.
//!
//! Entries do not live for a fixed duration. Every write expires at the
//! cutoff time (14:11 local by default) of the day after the write, which
//! lines cached query results up with the exchange's daily publication.
//!
//! Payloads are stored as JSON arrays. Dates and timestamps are encoded as
//! ISO-8601 strings. Elements are either passed through serde unchanged
//! ([`CacheLayer::set`], e.g. a list of dates) or converted with their own
//! [`CacheRecord::to_dict`] first ([`CacheLayer::set_records`]).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDateTime, NaiveTime};
use redis::Commands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config;
use crate::error::{Result, SpimexError};
use crate::models::TradingResult;

// ---------------------------------------------------------------------------
// Expiry
// ---------------------------------------------------------------------------

/// The instant a cache entry written at `now` expires: `cutoff` on the
/// following day.
pub fn cache_expiry(now: NaiveDateTime, cutoff: NaiveTime) -> NaiveDateTime {
    let tomorrow = now.date().succ_opt().unwrap_or(now.date());
    tomorrow.and_time(cutoff)
}

/// Whole seconds from `now` until [`cache_expiry`], never less than one.
///
/// Redis rejects a zero expire time, so a write in the last second before
/// the cutoff still gets a one-second lifetime.
pub fn seconds_until_cutoff(now: NaiveDateTime, cutoff: NaiveTime) -> u64 {
    let secs = (cache_expiry(now, cutoff) - now).num_seconds();
    u64::try_from(secs).unwrap_or(0).max(1)
}

// ---------------------------------------------------------------------------
// CacheRecord
// ---------------------------------------------------------------------------

/// Conversion of a persisted entity into its cached dictionary form.
pub trait CacheRecord {
    fn to_dict(&self) -> Map<String, Value>;
}

impl CacheRecord for TradingResult {
    fn to_dict(&self) -> Map<String, Value> {
        let value = json!({
            "id": self.id,
            "exchange_product_id": self.exchange_product_id,
            "exchange_product_name": self.exchange_product_name,
            "oil_id": self.oil_id,
            "delivery_basis_id": self.delivery_basis_id,
            "delivery_basis_name": self.delivery_basis_name,
            "delivery_type_id": self.delivery_type_id,
            "volume": self.volume,
            "total": self.total.map(|t| t.to_string()),
            "count": self.count,
            "date": self.date,
            "created_on": self.created_on,
            "updated_on": self.updated_on,
        });
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

/// Key/value store underneath a [`CacheLayer`].
pub trait CacheBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, expiring after `ttl_secs` seconds.
    fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()>;

    /// Drop every entry.
    fn flush(&self) -> Result<()>;

    /// Release any held connection. Later calls may reconnect.
    fn close(&self) {}

    fn name(&self) -> &'static str;
}

/// Redis-backed cache; the connection is opened on first use and shared.
pub struct RedisBackend {
    client: redis::Client,
    conn: Mutex<Option<redis::Connection>>,
}

impl RedisBackend {
    /// Create a backend for `url` (e.g. `redis://:password@localhost:6379/0`).
    ///
    /// No connection is made until the first cache operation.
    pub fn open(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            conn: Mutex::new(None),
        })
    }

    fn with_conn<T>(
        &self,
        op: impl FnOnce(&mut redis::Connection) -> redis::RedisResult<T>,
    ) -> Result<T> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| SpimexError::InvalidArgument("redis connection lock poisoned".into()))?;
        if guard.is_none() {
            *guard = Some(self.client.get_connection()?);
            debug!("connected to redis");
        }
        let Some(conn) = guard.as_mut() else {
            return Err(SpimexError::NotFound("redis connection".into()));
        };
        match op(conn) {
            Ok(v) => Ok(v),
            Err(e) => {
                if e.is_connection_dropped() || e.is_io_error() {
                    *guard = None;
                }
                Err(e.into())
            }
        }
    }
}

impl CacheBackend for RedisBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_conn(|conn| conn.get(key))
    }

    fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        self.with_conn(|conn| conn.set_ex(key, value, ttl_secs))
    }

    fn flush(&self) -> Result<()> {
        self.with_conn(|conn| redis::cmd("FLUSHDB").query(conn))
    }

    fn close(&self) {
        if let Ok(mut guard) = self.conn.lock() {
            *guard = None;
        }
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

/// In-process cache honouring the same expiry rule.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, (String, Instant)>>> {
        self.entries
            .lock()
            .map_err(|_| SpimexError::InvalidArgument("memory cache lock poisoned".into()))
    }
}

impl CacheBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.lock()?;
        match entries.get(key) {
            Some((_, expires)) if *expires <= Instant::now() => {
                entries.remove(key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        let expires = Instant::now() + Duration::from_secs(ttl_secs);
        self.lock()?
            .insert(key.to_string(), (value.to_string(), expires));
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

// ---------------------------------------------------------------------------
// CacheLayer
// ---------------------------------------------------------------------------

/// JSON cache for query results, expiring at the daily cutoff.
pub struct CacheLayer {
    backend: Box<dyn CacheBackend>,
    cutoff: NaiveTime,
}

impl CacheLayer {
    pub fn new(backend: Box<dyn CacheBackend>, cutoff: NaiveTime) -> Self {
        Self { backend, cutoff }
    }

    /// In-process cache with the default cutoff.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryBackend::new()), config::default_cache_cutoff())
    }

    /// Redis cache with the given cutoff. Connects lazily.
    pub fn redis(url: &str, cutoff: NaiveTime) -> Result<Self> {
        Ok(Self::new(Box::new(RedisBackend::open(url)?), cutoff))
    }

    pub fn cutoff(&self) -> NaiveTime {
        self.cutoff
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Seconds a value written now stays cached.
    pub fn expiry_seconds(&self) -> u64 {
        seconds_until_cutoff(Local::now().naive_local(), self.cutoff)
    }

    /// Fetch and decode a cached payload. Missing and empty entries are `None`.
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        match self.backend.get(key)? {
            Some(raw) if !raw.is_empty() => Ok(Some(serde_json::from_str(&raw)?)),
            _ => Ok(None),
        }
    }

    /// Fetch a cached payload and deserialize it into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Cache `items` as a JSON array, serializing each element as-is.
    pub fn set<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        let payload = serde_json::to_string(items)?;
        self.store(key, &payload)
    }

    /// Cache `items` as a JSON array of their [`CacheRecord::to_dict`] forms.
    pub fn set_records<T: CacheRecord>(&self, key: &str, items: &[T]) -> Result<()> {
        let dicts: Vec<Value> = items.iter().map(|i| Value::Object(i.to_dict())).collect();
        let payload = serde_json::to_string(&dicts)?;
        self.store(key, &payload)
    }

    fn store(&self, key: &str, payload: &str) -> Result<()> {
        let ttl = self.expiry_seconds();
        self.backend.set_ex(key, payload, ttl)?;
        debug!(key, ttl, bytes = payload.len(), "cached");
        Ok(())
    }

    /// Drop every cached entry.
    pub fn flush(&self) -> Result<()> {
        self.backend.flush()
    }

    /// Release the backend connection.
    pub fn close(&self) {
        self.backend.close();
    }
}
