//! Service configuration.
//!
//! Secrets and handles come from the environment; every tuning parameter is a
//! compile-time constant so the pricing and robustness contracts stay in one
//! place.

/// Full metric records live this long in the cache.
pub const METRICS_CACHE_TTL_SECS: i64 = 300;

/// Stale VWAP records are the last-resort answer and persist for a week.
pub const STALE_VWAP_TTL_SECS: i64 = 604_800;

/// VWAP probe windows, shortest first. The first window meeting the trade
/// floor wins; order is a contract, not a heuristic.
pub const VWAP_WINDOWS_HOURS: [u32; 3] = [6, 12, 24];

/// Minimum trades inside a window before its VWAP is trusted.
pub const MIN_TRADES_FOR_VWAP: usize = 10;

/// One trade buffer per request covers the longest VWAP window.
pub const TRADE_BUFFER_HOURS: u32 = 24;

/// How far the manipulator must push the best price, in probability.
pub const PRICE_MOVE_DELTA: f64 = 0.05;

/// Below this cost-to-move the price is fragile.
pub const COST_CAUTION_FLOOR: i64 = 10_000;

/// At or above this cost-to-move the price is reportable.
pub const COST_REPORTABLE_FLOOR: i64 = 100_000;

/// Per-request deadline on vendor calls.
pub const UPSTREAM_TIMEOUT_SECS: u64 = 10;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub dome_api_key: Option<String>,
    pub cache_db_path: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        let dome_api_key = std::env::var("DOME_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        let cache_db_path = std::env::var("CACHE_DB_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty());

        Ok(Self {
            port,
            dome_api_key,
            cache_db_path,
        })
    }
}
