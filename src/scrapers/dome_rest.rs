//! Dome REST API client — the single market-data vendor behind both venues.
//!
//! Upstream failures never propagate: a missing credential, transport error,
//! non-2xx status, or undecodable payload is logged and yields an empty book
//! or an empty trade list, and the pricing tiers degrade from there.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::UPSTREAM_TIMEOUT_SECS;
use crate::models::{OrderBook, OrderBookLevel, Trade, Venue};

const DOME_API_BASE: &str = "https://api.domeapi.io/v1";

/// Snapshots are requested over a trailing window; only the newest is used.
const ORDERBOOK_LOOKBACK_SECS: i64 = 3600;

/// Timestamps below this are epoch seconds, not milliseconds.
const MS_EPOCH_CUTOFF: f64 = 1e12;

pub struct DomeRestClient {
    client: Option<Client>,
    base_url: String,
}

impl DomeRestClient {
    /// Build the client; without a credential it stays unconfigured and every
    /// fetch degrades to empty.
    pub fn new(api_key: Option<String>) -> Self {
        let client = api_key.and_then(|key| Self::build_http_client(&key));
        Self {
            client,
            base_url: DOME_API_BASE.to_string(),
        }
    }

    fn build_http_client(api_key: &str) -> Option<Client> {
        let mut headers = reqwest::header::HeaderMap::new();
        let bearer = match format!("Bearer {}", api_key).parse() {
            Ok(v) => v,
            Err(_) => {
                warn!("DOME api key is not a valid header value");
                return None;
            }
        };
        headers.insert(reqwest::header::AUTHORIZATION, bearer);

        match Client::builder()
            .timeout(Duration::from_secs(UPSTREAM_TIMEOUT_SECS))
            .pool_max_idle_per_host(10)
            .user_agent("Bellwether/1.0 (Market Metrics)")
            .default_headers(headers)
            .build()
        {
            Ok(c) => Some(c),
            Err(e) => {
                warn!(error = %e, "failed to build Dome HTTP client");
                None
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    fn require_client(&self) -> Result<&Client> {
        match &self.client {
            Some(c) => Ok(c),
            None => bail!("DOME_API_KEY not configured"),
        }
    }

    /// Latest normalised order book for the market, empty on any failure.
    pub async fn fetch_orderbook(&self, venue: Venue, id: &str) -> OrderBook {
        match self.try_fetch_orderbook(venue, id).await {
            Ok(book) => {
                debug!(
                    venue = venue.as_str(),
                    id,
                    bids = book.bids.len(),
                    asks = book.asks.len(),
                    "orderbook fetched"
                );
                book
            }
            Err(e) => {
                warn!(venue = venue.as_str(), id, error = %e, "orderbook fetch failed, treating as empty");
                OrderBook::default()
            }
        }
    }

    /// Trades over the trailing window, empty on any failure. Trades with a
    /// non-positive price or a timestamp before the window start are dropped.
    pub async fn fetch_trades(&self, venue: Venue, id: &str, window_hours: u32) -> Vec<Trade> {
        match self.try_fetch_trades(venue, id, window_hours).await {
            Ok(trades) => {
                debug!(
                    venue = venue.as_str(),
                    id,
                    window_hours,
                    count = trades.len(),
                    "trades fetched"
                );
                trades
            }
            Err(e) => {
                warn!(venue = venue.as_str(), id, error = %e, "trades fetch failed, treating as empty");
                Vec::new()
            }
        }
    }

    async fn try_fetch_orderbook(&self, venue: Venue, id: &str) -> Result<OrderBook> {
        let client = self.require_client()?;
        let (path, id_param) = match venue {
            Venue::Polymarket => ("/polymarket/orderbooks", "token_id"),
            Venue::Kalshi => ("/kalshi/orderbooks", "ticker"),
        };

        let end_ms = Utc::now().timestamp_millis();
        let start_ms = end_ms - ORDERBOOK_LOOKBACK_SECS * 1000;
        let qp = [
            (id_param, id.to_string()),
            ("start_time", start_ms.to_string()),
            ("end_time", end_ms.to_string()),
        ];

        let url = format!("{}{}", self.base_url, path);
        let resp = client
            .get(&url)
            .query(&qp)
            .send()
            .await
            .with_context(|| format!("GET {} failed", path))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("GET {} {}: {}", path, status, text);
        }

        let body: Value = resp
            .json()
            .await
            .with_context(|| format!("parse {} response", path))?;

        let snapshots = body
            .get("snapshots")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        Ok(latest_snapshot(snapshots)
            .map(parse_book_snapshot)
            .unwrap_or_default())
    }

    async fn try_fetch_trades(
        &self,
        venue: Venue,
        id: &str,
        window_hours: u32,
    ) -> Result<Vec<Trade>> {
        let client = self.require_client()?;
        let (path, id_param, list_key) = match venue {
            Venue::Polymarket => ("/polymarket/orders", "token_id", "orders"),
            Venue::Kalshi => ("/kalshi/trades", "ticker", "trades"),
        };

        let end_secs = Utc::now().timestamp();
        let start_secs = end_secs - i64::from(window_hours) * 3600;
        let qp = [
            (id_param, id.to_string()),
            ("start_time", start_secs.to_string()),
            ("end_time", end_secs.to_string()),
            ("limit", "1000".to_string()),
        ];

        let url = format!("{}{}", self.base_url, path);
        let resp = client
            .get(&url)
            .query(&qp)
            .send()
            .await
            .with_context(|| format!("GET {} failed", path))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("GET {} {}: {}", path, status, text);
        }

        let body: Value = resp
            .json()
            .await
            .with_context(|| format!("parse {} response", path))?;

        let items = body
            .get(list_key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        Ok(parse_trades(items, start_secs * 1000))
    }
}

/// Snapshots can arrive in any order; the newest timestamp wins.
fn latest_snapshot(snapshots: &[Value]) -> Option<&Value> {
    snapshots
        .iter()
        .max_by_key(|snap| field_f64(snap, &["timestamp"]).unwrap_or(0.0) as i64)
}

/// Normalise one vendor snapshot into an order book.
///
/// Polymarket-style payloads carry `bids`/`asks` objects keyed `price`/`p`
/// and `size`/`s`. Kalshi-style payloads carry `yes_dollars` (asks at the
/// listed price) and `no_dollars` (a bid on "No" at p is a bid on "Yes" at
/// 1 − p), sometimes nested under an `orderbook` key.
fn parse_book_snapshot(snap: &Value) -> OrderBook {
    let bids_v = snap.get("bids").and_then(Value::as_array);
    let asks_v = snap.get("asks").and_then(Value::as_array);
    if bids_v.is_some() || asks_v.is_some() {
        let parse_side = |levels: Option<&Vec<Value>>| -> Vec<OrderBookLevel> {
            levels
                .map(|ls| {
                    ls.iter()
                        .filter_map(|l| {
                            let price = field_f64(l, &["price", "p"])?;
                            let size = field_f64(l, &["size", "s"])?;
                            Some(OrderBookLevel { price, size })
                        })
                        .collect()
                })
                .unwrap_or_default()
        };
        return OrderBook {
            bids: parse_side(bids_v),
            asks: parse_side(asks_v),
        }
        .normalize();
    }

    let root = snap.get("orderbook").unwrap_or(snap);
    let pairs = |key: &str| -> Vec<(f64, f64)> {
        root.get(key)
            .and_then(Value::as_array)
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| {
                        let row = row.as_array()?;
                        let price = value_as_f64(row.first()?)?;
                        let size = value_as_f64(row.get(1)?)?;
                        Some((price, size))
                    })
                    .collect()
            })
            .unwrap_or_default()
    };

    let asks = pairs("yes_dollars")
        .into_iter()
        .map(|(price, size)| OrderBookLevel { price, size })
        .collect();
    let bids = pairs("no_dollars")
        .into_iter()
        .map(|(price, size)| OrderBookLevel {
            price: 1.0 - price,
            size,
        })
        .collect();
    OrderBook { bids, asks }.normalize()
}

/// Normalise vendor trade objects, dropping anything unpriceable or outside
/// the window.
fn parse_trades(items: &[Value], window_start_ms: i64) -> Vec<Trade> {
    items
        .iter()
        .filter_map(parse_trade)
        .filter(|t| t.price > 0.0 && t.timestamp_ms >= window_start_ms)
        .collect()
}

/// Field names vary per venue; the first recognised name in each list is
/// authoritative and values may be numbers or numeric strings.
fn parse_trade(v: &Value) -> Option<Trade> {
    let price = field_f64(v, &["price", "p", "yes_price_dollars"])?;
    let size = field_f64(v, &["shares_normalized", "shares", "size", "amount", "s", "count"])
        .unwrap_or(1.0);
    let ts = field_f64(v, &["timestamp", "t", "time", "created_at", "created_time"])?;
    let timestamp_ms = if ts < MS_EPOCH_CUTOFF {
        (ts * 1000.0) as i64
    } else {
        ts as i64
    };
    Some(Trade {
        price,
        size,
        timestamp_ms,
    })
}

fn value_as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn field_f64(obj: &Value, names: &[&str]) -> Option<f64> {
    names.iter().find_map(|n| obj.get(n).and_then(value_as_f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn polymarket_snapshot_parses_and_sorts() {
        let snap = json!({
            "timestamp": 1_700_000_000_000i64,
            "bids": [
                {"price": "0.54", "size": "1000"},
                {"price": "0.58", "size": "500"},
                {"price": "0", "size": "10"}
            ],
            "asks": [
                {"p": 0.66, "s": 1_000_000.0},
                {"p": 0.60, "s": 500_000.0}
            ]
        });
        let book = parse_book_snapshot(&snap);
        assert_eq!(book.bids.len(), 2);
        assert_eq!(book.bids[0].price, 0.58);
        assert_eq!(book.asks[0].price, 0.60);
        assert_eq!(book.asks[0].size, 500_000.0);
    }

    #[test]
    fn kalshi_snapshot_inverts_no_side() {
        let snap = json!({
            "timestamp": 1_700_000_000_000i64,
            "orderbook": {
                "yes_dollars": [["0.52", 100], ["0.55", 200]],
                "no_dollars": [["0.40", 300], ["0.45", 150]]
            }
        });
        let book = parse_book_snapshot(&snap);
        // no at 0.40 is a yes bid at 0.60; no at 0.45 a yes bid at 0.55.
        assert!((book.bids[0].price - 0.60).abs() < 1e-9);
        assert_eq!(book.bids[0].size, 300.0);
        assert!((book.bids[1].price - 0.55).abs() < 1e-9);
        assert_eq!(book.asks[0].price, 0.52);
        assert_eq!(book.asks[1].price, 0.55);
    }

    #[test]
    fn kalshi_snapshot_without_nesting_also_parses() {
        let snap = json!({
            "yes_dollars": [["0.52", 100]],
            "no_dollars": [["0.40", 300]]
        });
        let book = parse_book_snapshot(&snap);
        assert_eq!(book.asks.len(), 1);
        assert_eq!(book.bids.len(), 1);
    }

    #[test]
    fn latest_snapshot_wins_regardless_of_order() {
        let snaps = vec![
            json!({"timestamp": 100, "bids": [{"price": 0.1, "size": 1}], "asks": []}),
            json!({"timestamp": 300, "bids": [{"price": 0.3, "size": 1}], "asks": []}),
            json!({"timestamp": 200, "bids": [{"price": 0.2, "size": 1}], "asks": []}),
        ];
        let latest = latest_snapshot(&snaps).unwrap();
        let book = parse_book_snapshot(latest);
        assert_eq!(book.bids[0].price, 0.3);
    }

    #[test]
    fn trade_field_variants_all_parse() {
        let poly = json!({
            "price": 0.61,
            "shares_normalized": 25.5,
            "shares": 25_500_000i64,
            "timestamp": 1_700_000_000i64
        });
        let t = parse_trade(&poly).unwrap();
        assert_eq!(t.price, 0.61);
        // First recognised size field wins; integer shares are never mixed in.
        assert_eq!(t.size, 25.5);
        // Seconds get scaled to milliseconds.
        assert_eq!(t.timestamp_ms, 1_700_000_000_000);

        let kalshi = json!({
            "yes_price_dollars": "0.56",
            "count": 40,
            "created_at": 1_700_000_000_500i64
        });
        let t = parse_trade(&kalshi).unwrap();
        assert_eq!(t.price, 0.56);
        assert_eq!(t.size, 40.0);
        assert_eq!(t.timestamp_ms, 1_700_000_000_500);

        // created_time is the only timestamp key on some Kalshi trades.
        let kalshi_created_time = json!({
            "yes_price_dollars": "0.56",
            "count": 40,
            "created_time": "1700000000"
        });
        let t = parse_trade(&kalshi_created_time).unwrap();
        assert_eq!(t.timestamp_ms, 1_700_000_000_000);
    }

    #[test]
    fn trade_defaults_size_to_one() {
        let v = json!({"p": 0.5, "t": 1_700_000_000i64});
        assert_eq!(parse_trade(&v).unwrap().size, 1.0);
    }

    #[test]
    fn trades_outside_window_or_unpriced_are_dropped() {
        let items = vec![
            json!({"price": 0.5, "size": 1, "timestamp": 2_000_000i64}),
            json!({"price": 0.5, "size": 1, "timestamp": 500_000i64}),
            json!({"price": 0.0, "size": 1, "timestamp": 2_000_000i64}),
            json!({"size": 1, "timestamp": 2_000_000i64}),
        ];
        let trades = parse_trades(&items, 1_000_000_000);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].timestamp_ms, 2_000_000_000);
    }

    #[test]
    fn unconfigured_client_reports_itself() {
        let client = DomeRestClient::new(None);
        assert!(!client.is_configured());
    }

    #[tokio::test]
    async fn unconfigured_client_degrades_to_empty() {
        let client = DomeRestClient::new(None);
        let book = client.fetch_orderbook(Venue::Polymarket, "tok").await;
        assert!(book.is_empty());
        let trades = client.fetch_trades(Venue::Kalshi, "TICK", 24).await;
        assert!(trades.is_empty());
    }
}
