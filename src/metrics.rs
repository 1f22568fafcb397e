//! Request coordinators: cache consultation, vendor fan-out, pricing,
//! robustness, and record assembly for both endpoint families.

use chrono::Utc;
use tracing::debug;

use crate::config::METRICS_CACHE_TTL_SECS;
use crate::models::{
    CombinedMetrics, MarketMetrics, OrderBook, PlatformPrices, Trade, Venue,
};
use crate::pricing::kernel::{cost_to_move_5c, midpoint};
use crate::pricing::robustness::{min_cost_and_weakest, raw_reportability, tier_adjust};
use crate::pricing::tiers::{combined_stale_key, price_combined, price_market};
use crate::AppState;

/// Why a per-market request could not be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsError {
    OrderBookUnavailable,
}

/// End-to-end per-market request. The stale side-cache is never consulted
/// here directly: an empty book is terminal for this path.
pub async fn market_metrics(
    state: &AppState,
    venue: Venue,
    token_id: &str,
) -> Result<MarketMetrics, MetricsError> {
    let now = Utc::now().timestamp();
    if let Some(mut hit) = state.cache.get_metrics(token_id) {
        // The substrate's expiry can be coarser than ours; re-check age.
        if now - hit.fetched_at <= METRICS_CACHE_TTL_SECS {
            hit.cached = true;
            debug!(token_id, "metrics served from cache");
            return Ok(hit);
        }
    }

    let book = state.dome.fetch_orderbook(venue, token_id).await;
    if book.is_empty() {
        return Err(MetricsError::OrderBookUnavailable);
    }

    let priced = price_market(&state.dome, &state.cache, venue, token_id, &book).await;
    let cost = cost_to_move_5c(&book);
    let raw = raw_reportability(cost);
    let reportability = tier_adjust(raw, priced.tiered.tier);

    let metrics = MarketMetrics {
        token_id: token_id.to_string(),
        platform: venue.as_str().to_string(),
        bellwether_price: priced.tiered.price,
        price_tier: priced.tiered.tier,
        price_label: priced.tiered.label.to_string(),
        price_source: priced.tiered.source.to_string(),
        vwap_window_hours: priced.tiered.window_hours,
        trade_count: priced.tiered.trade_count,
        total_volume: priced.tiered.total_volume,
        orderbook_midpoint: midpoint(&book),
        current_price: latest_trade_price(&priced.trades_24h),
        cost_to_move_5c: cost,
        raw_reportability: raw,
        reportability,
        fetched_at: Utc::now().timestamp(),
        cached: false,
    };

    state.cache.put_metrics(token_id, &metrics);
    Ok(metrics)
}

/// Cross-venue request: both books in parallel, pooled pricing, weakest-link
/// robustness. Callers guarantee at least one identifier.
pub async fn combined_metrics(
    state: &AppState,
    pm_token: Option<&str>,
    k_ticker: Option<&str>,
) -> CombinedMetrics {
    let cache_key = combined_stale_key(pm_token, k_ticker);
    let now = Utc::now().timestamp();
    if let Some(mut hit) = state.cache.get_combined(&cache_key) {
        if now - hit.fetched_at <= METRICS_CACHE_TTL_SECS {
            hit.cached = true;
            debug!(key = %cache_key, "combined metrics served from cache");
            return hit;
        }
    }

    let (pm_book, k_book) = tokio::join!(
        async {
            match pm_token {
                Some(id) => state.dome.fetch_orderbook(Venue::Polymarket, id).await,
                None => OrderBook::default(),
            }
        },
        async {
            match k_ticker {
                Some(id) => state.dome.fetch_orderbook(Venue::Kalshi, id).await,
                None => OrderBook::default(),
            }
        }
    );
    let merged = OrderBook::merged(&pm_book, &k_book);

    let priced = price_combined(&state.dome, &state.cache, pm_token, k_ticker, &merged).await;

    let (min_cost, weakest) =
        min_cost_and_weakest(cost_to_move_5c(&pm_book), cost_to_move_5c(&k_book));
    let raw = raw_reportability(min_cost);
    let reportability = tier_adjust(raw, priced.tiered.tier);

    let metrics = CombinedMetrics {
        polymarket_token: pm_token.map(str::to_string),
        kalshi_ticker: k_ticker.map(str::to_string),
        bellwether_price: priced.tiered.price,
        price_tier: priced.tiered.tier,
        price_label: priced.tiered.label.to_string(),
        price_source: priced.tiered.source.to_string(),
        vwap_window_hours: priced.tiered.window_hours,
        trade_count: priced.tiered.trade_count,
        total_volume: priced.tiered.total_volume,
        orderbook_midpoint: midpoint(&merged),
        platform_prices: PlatformPrices {
            polymarket: latest_trade_price(&priced.polymarket_trades),
            kalshi: latest_trade_price(&priced.kalshi_trades),
        },
        cost_to_move_5c: min_cost,
        weakest_platform: weakest.to_string(),
        raw_reportability: raw,
        reportability,
        fetched_at: Utc::now().timestamp(),
        cached: false,
    };

    state.cache.put_combined(&cache_key, &metrics);
    metrics
}

fn latest_trade_price(trades: &[Trade]) -> Option<f64> {
    trades
        .iter()
        .max_by_key(|t| t.timestamp_ms)
        .map(|t| t.price)
}
