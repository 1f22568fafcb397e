//! The tiered pricer: windowed VWAPs, then the book midpoint, then the
//! stale side-cache, then an honest "no data".
//!
//! Window order is a contract: the shortest window meeting the trade floor
//! wins even when a longer one holds more trades. Whenever a VWAP tier is
//! adopted its result is persisted to the stale side-cache, which is read
//! back only after every live tier has failed.

use chrono::Utc;
use tracing::debug;

use crate::cache::MetricsCache;
use crate::config::{MIN_TRADES_FOR_VWAP, TRADE_BUFFER_HOURS, VWAP_WINDOWS_HOURS};
use crate::models::{OrderBook, StaleVwap, TieredPrice, Trade, Venue};
use crate::pricing::kernel::{midpoint, vwap, VwapResult};
use crate::scrapers::DomeRestClient;

/// Per-venue pricing outcome plus the trade buffer it was derived from, so
/// coordinators can take current prices without refetching.
pub struct PricedMarket {
    pub tiered: TieredPrice,
    pub trades_24h: Vec<Trade>,
}

/// Cross-venue outcome; per-venue buffers are kept apart for the
/// platform-price fields.
pub struct CombinedPriced {
    pub tiered: TieredPrice,
    pub polymarket_trades: Vec<Trade>,
    pub kalshi_trades: Vec<Trade>,
}

/// Price one venue's market from its (already fetched) order book.
pub async fn price_market(
    dome: &DomeRestClient,
    cache: &MetricsCache,
    venue: Venue,
    token_id: &str,
    book: &OrderBook,
) -> PricedMarket {
    let trades_24h = dome.fetch_trades(venue, token_id, TRADE_BUFFER_HOURS).await;
    let tiered = tiered_from_parts(cache, token_id, &trades_24h, book);
    PricedMarket { tiered, trades_24h }
}

/// Price the pooled cross-venue market: union of both venues' trades,
/// concatenated book, composite stale key.
pub async fn price_combined(
    dome: &DomeRestClient,
    cache: &MetricsCache,
    pm_token: Option<&str>,
    k_ticker: Option<&str>,
    merged_book: &OrderBook,
) -> CombinedPriced {
    let (polymarket_trades, kalshi_trades) = tokio::join!(
        async {
            match pm_token {
                Some(id) => {
                    dome.fetch_trades(Venue::Polymarket, id, TRADE_BUFFER_HOURS)
                        .await
                }
                None => Vec::new(),
            }
        },
        async {
            match k_ticker {
                Some(id) => dome.fetch_trades(Venue::Kalshi, id, TRADE_BUFFER_HOURS).await,
                None => Vec::new(),
            }
        }
    );

    let mut pooled = polymarket_trades.clone();
    pooled.extend_from_slice(&kalshi_trades);

    let stale_key = combined_stale_key(pm_token, k_ticker);
    let tiered = tiered_from_parts(cache, &stale_key, &pooled, merged_book);
    CombinedPriced {
        tiered,
        polymarket_trades,
        kalshi_trades,
    }
}

/// Stale side-cache key for a cross-venue market.
pub fn combined_stale_key(pm_token: Option<&str>, k_ticker: Option<&str>) -> String {
    format!("{}_{}", pm_token.unwrap_or(""), k_ticker.unwrap_or(""))
}

/// The cascade itself, clock passed in via `trades` timestamps and `Utc::now`.
fn tiered_from_parts(
    cache: &MetricsCache,
    stale_key: &str,
    trades_24h: &[Trade],
    book: &OrderBook,
) -> TieredPrice {
    let now_ms = Utc::now().timestamp_millis();

    if let Some((hours, v)) = select_vwap_window(trades_24h, now_ms) {
        cache.put_stale_vwap(
            stale_key,
            &StaleVwap {
                price: v.price,
                window_hours: hours,
                trade_count: v.trade_count,
                stored_at: Utc::now().timestamp(),
            },
        );
        let (label, source) = window_label(hours);
        return TieredPrice {
            price: Some(v.price),
            tier: if hours == 6 { 1 } else { 2 },
            label,
            source,
            window_hours: Some(hours),
            trade_count: v.trade_count,
            total_volume: v.total_volume,
        };
    }

    if let Some(mid) = midpoint(book) {
        debug!(stale_key, mid, "no VWAP window qualified, using midpoint");
        return TieredPrice {
            price: Some(mid),
            tier: 3,
            label: "Order book midpoint",
            source: "orderbook_midpoint",
            window_hours: None,
            trade_count: trades_24h.len() as u64,
            total_volume: trades_24h.iter().map(|t| t.size).sum::<f64>().round() as i64,
        };
    }

    if let Some(stale) = cache.get_stale_vwap(stale_key) {
        debug!(stale_key, "live tiers failed, answering from stale VWAP");
        return TieredPrice {
            price: Some(stale.price),
            tier: 4,
            label: "Last VWAP (stale)",
            source: "stale_vwap",
            window_hours: Some(stale.window_hours),
            trade_count: stale.trade_count,
            total_volume: 0,
        };
    }

    TieredPrice::no_data()
}

/// Probe windows shortest-first; a window is adopted when it holds enough
/// trades to yield a computable VWAP.
fn select_vwap_window(trades_24h: &[Trade], now_ms: i64) -> Option<(u32, VwapResult)> {
    for hours in VWAP_WINDOWS_HOURS {
        let cutoff = now_ms - i64::from(hours) * 3_600_000;
        let windowed: Vec<Trade> = trades_24h
            .iter()
            .copied()
            .filter(|t| t.timestamp_ms >= cutoff)
            .collect();
        if windowed.len() >= MIN_TRADES_FOR_VWAP {
            if let Some(v) = vwap(&windowed) {
                return Some((hours, v));
            }
        }
    }
    None
}

fn window_label(hours: u32) -> (&'static str, &'static str) {
    match hours {
        6 => ("6h VWAP", "6h_vwap"),
        12 => ("12h VWAP", "12h_vwap"),
        _ => ("24h VWAP", "24h_vwap"),
    }
}
