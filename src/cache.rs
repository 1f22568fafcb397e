//! Two-namespace TTL cache over an optional SQLite substrate.
//!
//! `metrics/` and `combined/` entries expire on the short TTL; `stale/`
//! entries hold the last good VWAP for a week and are exempt from the
//! coordinator's freshness re-check. Without a configured substrate every
//! operation is a no-op and the service simply fans out on each request.

use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{METRICS_CACHE_TTL_SECS, STALE_VWAP_TTL_SECS};
use crate::models::{CombinedMetrics, MarketMetrics, StaleVwap};

pub struct MetricsCache {
    conn: Option<Mutex<Connection>>,
}

impl MetricsCache {
    /// Open the substrate at `path`, or run disabled when `path` is `None`.
    /// An unopenable substrate degrades to disabled rather than failing boot.
    pub fn open(path: Option<&str>) -> Self {
        let Some(path) = path else {
            return Self::disabled();
        };
        match Self::try_open(path) {
            Ok(conn) => {
                info!(path, "metrics cache enabled");
                Self {
                    conn: Some(Mutex::new(conn)),
                }
            }
            Err(e) => {
                warn!(path, error = %e, "metrics cache unavailable, running without");
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self { conn: None }
    }

    fn try_open(path: &str) -> Result<Connection> {
        let conn = Connection::open(path).context("open cache database")?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS metric_cache (
                cache_key  TEXT PRIMARY KEY,
                cache_json TEXT NOT NULL,
                stored_at  INTEGER NOT NULL
            )",
            [],
        )
        .context("create cache table")?;
        Ok(conn)
    }

    pub fn is_configured(&self) -> bool {
        self.conn.is_some()
    }

    /// Store-level expiry: rows older than the namespace TTL never come back.
    fn get_raw(&self, key: &str, ttl_secs: i64) -> Option<(String, i64)> {
        let conn = self.conn.as_ref()?.lock();
        let min_stored_at = Utc::now().timestamp() - ttl_secs;
        let result = (|| -> Result<Option<(String, i64)>> {
            let mut stmt = conn.prepare_cached(
                "SELECT cache_json, stored_at FROM metric_cache
                 WHERE cache_key = ?1 AND stored_at >= ?2",
            )?;
            let mut rows = stmt.query(params![key, min_stored_at])?;
            let Some(row) = rows.next()? else {
                return Ok(None);
            };
            Ok(Some((row.get(0)?, row.get(1)?)))
        })();
        match result {
            Ok(hit) => hit,
            Err(e) => {
                warn!(key, error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    fn put_raw(&self, key: &str, json: &str, stored_at: i64) {
        let Some(conn) = self.conn.as_ref() else {
            return;
        };
        let conn = conn.lock();
        let result = conn.execute(
            "INSERT INTO metric_cache (cache_key, cache_json, stored_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(cache_key) DO UPDATE SET
                 cache_json = excluded.cache_json, stored_at = excluded.stored_at",
            params![key, json, stored_at],
        );
        if let Err(e) = result {
            warn!(key, error = %e, "cache write failed, continuing without");
        }
    }

    fn get_typed<T: DeserializeOwned>(&self, key: &str, ttl_secs: i64) -> Option<T> {
        let (json, _) = self.get_raw(key, ttl_secs)?;
        match serde_json::from_str(&json) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(key, error = %e, "cache entry undecodable, treating as miss");
                None
            }
        }
    }

    fn put_typed<T: Serialize>(&self, key: &str, value: &T) {
        if self.conn.is_none() {
            return;
        }
        match serde_json::to_string(value) {
            Ok(json) => self.put_raw(key, &json, Utc::now().timestamp()),
            Err(e) => warn!(key, error = %e, "cache encode failed, continuing without"),
        }
    }

    pub fn get_metrics(&self, token_id: &str) -> Option<MarketMetrics> {
        self.get_typed(&format!("metrics/{token_id}"), METRICS_CACHE_TTL_SECS)
    }

    pub fn put_metrics(&self, token_id: &str, metrics: &MarketMetrics) {
        self.put_typed(&format!("metrics/{token_id}"), metrics);
    }

    pub fn get_combined(&self, key: &str) -> Option<CombinedMetrics> {
        self.get_typed(&format!("combined/{key}"), METRICS_CACHE_TTL_SECS)
    }

    pub fn put_combined(&self, key: &str, metrics: &CombinedMetrics) {
        self.put_typed(&format!("combined/{key}"), metrics);
    }

    pub fn get_stale_vwap(&self, key: &str) -> Option<StaleVwap> {
        self.get_typed(&format!("stale/{key}"), STALE_VWAP_TTL_SECS)
    }

    pub fn put_stale_vwap(&self, key: &str, stale: &StaleVwap) {
        self.put_typed(&format!("stale/{key}"), stale);
    }
}
