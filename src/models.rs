//! Core domain types: normalised market data, tiered prices, and the metric
//! records served over HTTP.

use serde::{Deserialize, Serialize};

/// The two venues the vendor adapter knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Venue {
    Polymarket,
    Kalshi,
}

impl Venue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Venue::Polymarket => "polymarket",
            Venue::Kalshi => "kalshi",
        }
    }

    /// Parse a path segment. Anything unrecognised is treated as an
    /// unmatched route by the API layer.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "polymarket" => Some(Venue::Polymarket),
            "kalshi" => Some(Venue::Kalshi),
            _ => None,
        }
    }
}

/// One price level of a normalised order book.
///
/// Both fields are strictly positive for any level that survives adapter
/// normalisation; prices are probabilities in (0, 1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderBookLevel {
    pub price: f64,
    pub size: f64,
}

/// A normalised order book: bids descending, asks ascending.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderBook {
    pub bids: Vec<OrderBookLevel>,
    pub asks: Vec<OrderBookLevel>,
}

impl OrderBook {
    /// Drop degenerate levels and restore side ordering. Idempotent.
    pub fn normalize(mut self) -> Self {
        self.bids
            .retain(|l| l.price > 0.0 && l.price < 1.0 && l.size > 0.0);
        self.asks
            .retain(|l| l.price > 0.0 && l.price < 1.0 && l.size > 0.0);
        self.bids.sort_by(|a, b| {
            b.price
                .partial_cmp(&a.price)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        self.asks.sort_by(|a, b| {
            a.price
                .partial_cmp(&b.price)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        self
    }

    /// A book with no levels on either side cannot answer anything.
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Concatenate two venues' books into one, re-normalised.
    pub fn merged(a: &OrderBook, b: &OrderBook) -> OrderBook {
        let mut bids = a.bids.clone();
        bids.extend_from_slice(&b.bids);
        let mut asks = a.asks.clone();
        asks.extend_from_slice(&b.asks);
        OrderBook { bids, asks }.normalize()
    }
}

/// A normalised trade. `timestamp_ms` is epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub price: f64,
    pub size: f64,
    pub timestamp_ms: i64,
}

/// Which pricing fallback produced the answer, with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct TieredPrice {
    pub price: Option<f64>,
    /// 1 = 6h VWAP, 2 = longer-window VWAP, 3 = book midpoint, 4 = stale/none.
    pub tier: u8,
    pub label: &'static str,
    pub source: &'static str,
    pub window_hours: Option<u32>,
    pub trade_count: u64,
    pub total_volume: i64,
}

impl TieredPrice {
    pub fn no_data() -> Self {
        TieredPrice {
            price: None,
            tier: 4,
            label: "No data",
            source: "none",
            window_hours: None,
            trade_count: 0,
            total_volume: 0,
        }
    }
}

/// Three-value verdict on whether the price is robust enough to quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reportability {
    Fragile,
    Caution,
    Reportable,
}

impl Reportability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reportability::Fragile => "fragile",
            Reportability::Caution => "caution",
            Reportability::Reportable => "reportable",
        }
    }
}

/// The full per-market answer, as served and as cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketMetrics {
    pub token_id: String,
    pub platform: String,
    pub bellwether_price: Option<f64>,
    pub price_tier: u8,
    pub price_label: String,
    pub price_source: String,
    pub vwap_window_hours: Option<u32>,
    pub trade_count: u64,
    pub total_volume: i64,
    pub orderbook_midpoint: Option<f64>,
    /// Price of the most recent trade inside the 24h window, if any.
    pub current_price: Option<f64>,
    pub cost_to_move_5c: Option<i64>,
    pub raw_reportability: Reportability,
    pub reportability: Reportability,
    /// Epoch seconds at assembly time; re-checked against the cache TTL on read.
    pub fetched_at: i64,
    pub cached: bool,
}

/// Last trade price per venue, for the cross-venue answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformPrices {
    pub polymarket: Option<f64>,
    pub kalshi: Option<f64>,
}

/// The cross-venue answer: pooled pricing, weakest-link robustness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedMetrics {
    pub polymarket_token: Option<String>,
    pub kalshi_ticker: Option<String>,
    pub bellwether_price: Option<f64>,
    pub price_tier: u8,
    pub price_label: String,
    pub price_source: String,
    pub vwap_window_hours: Option<u32>,
    pub trade_count: u64,
    pub total_volume: i64,
    pub orderbook_midpoint: Option<f64>,
    pub platform_prices: PlatformPrices,
    pub cost_to_move_5c: Option<i64>,
    /// Venue whose book was cheapest to move, or "unknown" when neither priced.
    pub weakest_platform: String,
    pub raw_reportability: Reportability,
    pub reportability: Reportability,
    pub fetched_at: i64,
    pub cached: bool,
}

/// Long-lived record of the last VWAP a market produced. Read only when every
/// live tier has failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaleVwap {
    pub price: f64,
    pub window_hours: u32,
    pub trade_count: u64,
    pub stored_at: i64,
}
