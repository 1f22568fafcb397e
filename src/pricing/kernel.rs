//! Pure pricing numerics: VWAP, cost-to-move, midpoint.
//!
//! No I/O and no clock access; every function depends only on its inputs so
//! results are reproducible against fixtures. Rounding happens once, at
//! return: prices to four decimals, costs and volumes to integers.

use crate::config::PRICE_MOVE_DELTA;
use crate::models::{OrderBook, OrderBookLevel, Trade};

/// Round a probability to four decimal places.
pub fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Volume-weighted average price over a trade slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VwapResult {
    pub price: f64,
    pub trade_count: u64,
    pub total_volume: i64,
}

/// Σ(price·size)/Σ(size), or `None` when the slice carries no volume.
pub fn vwap(trades: &[Trade]) -> Option<VwapResult> {
    let mut notional = 0.0;
    let mut volume = 0.0;
    for t in trades {
        notional += t.price * t.size;
        volume += t.size;
    }
    if volume <= 0.0 {
        return None;
    }
    Some(VwapResult {
        price: round4(notional / volume),
        trade_count: trades.len() as u64,
        total_volume: volume.round() as i64,
    })
}

/// Dollar cost of lifting the asks until the best ask sits 5¢ higher.
///
/// Walks asks in order; a level at or past the threshold ends the walk
/// without being consumed (the price now rests there). Levels inside the
/// band contribute their full `price · size`. `None` when the side is empty
/// or the book lacks the depth to cross.
pub fn cost_to_move_up(asks: &[OrderBookLevel]) -> Option<i64> {
    let first = asks.first()?;
    let target = first.price + PRICE_MOVE_DELTA;
    let mut spend: f64 = 0.0;
    for level in asks {
        if level.price >= target {
            return Some(spend.round() as i64);
        }
        spend += level.price * level.size;
    }
    None
}

/// Symmetric walk down the bids until the best bid sits 5¢ lower.
pub fn cost_to_move_down(bids: &[OrderBookLevel]) -> Option<i64> {
    let first = bids.first()?;
    let target = first.price - PRICE_MOVE_DELTA;
    let mut spend: f64 = 0.0;
    for level in bids {
        if level.price <= target {
            return Some(spend.round() as i64);
        }
        spend += level.price * level.size;
    }
    None
}

/// The manipulator picks the cheaper direction; min over whichever
/// directions are computable.
pub fn cost_to_move_5c(book: &OrderBook) -> Option<i64> {
    match (cost_to_move_up(&book.asks), cost_to_move_down(&book.bids)) {
        (Some(up), Some(down)) => Some(up.min(down)),
        (Some(up), None) => Some(up),
        (None, Some(down)) => Some(down),
        (None, None) => None,
    }
}

/// `(best_bid + best_ask) / 2`, or `None` when either side is empty.
pub fn midpoint(book: &OrderBook) -> Option<f64> {
    let bid = book.bids.first()?.price;
    let ask = book.asks.first()?.price;
    Some(round4((bid + ask) / 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(price: f64, size: f64) -> OrderBookLevel {
        OrderBookLevel { price, size }
    }

    fn trade(price: f64, size: f64) -> Trade {
        Trade {
            price,
            size,
            timestamp_ms: 0,
        }
    }

    #[test]
    fn vwap_weights_by_size() {
        let trades = [trade(0.60, 100.0), trade(0.70, 300.0)];
        let v = vwap(&trades).unwrap();
        assert_eq!(v.price, 0.675);
        assert_eq!(v.trade_count, 2);
        assert_eq!(v.total_volume, 400);
    }

    #[test]
    fn vwap_empty_or_zero_volume_is_none() {
        assert!(vwap(&[]).is_none());
        assert!(vwap(&[trade(0.5, 0.0)]).is_none());
    }

    #[test]
    fn vwap_stays_within_price_bounds() {
        let trades = [trade(0.21, 5.0), trade(0.34, 2.5), trade(0.29, 11.0)];
        let v = vwap(&trades).unwrap();
        assert!(v.price >= 0.21 && v.price <= 0.34);
    }

    #[test]
    fn vwap_rounds_to_four_decimals() {
        let trades = [trade(0.1, 1.0), trade(0.2, 2.0)];
        // 0.5/3 = 0.1666...
        assert_eq!(vwap(&trades).unwrap().price, 0.1667);
    }

    #[test]
    fn cost_up_stops_at_crossing_level() {
        // Walking 0.60×500k fills the band; 0.66 >= 0.65 ends the walk unconsumed.
        let asks = [level(0.60, 500_000.0), level(0.66, 1_000_000.0)];
        assert_eq!(cost_to_move_up(&asks), Some(300_000));
    }

    #[test]
    fn cost_up_crossing_level_exactly_at_threshold() {
        let asks = [level(0.60, 100.0), level(0.62, 100.0), level(0.65, 100.0)];
        // 0.65 == 0.60 + 0.05 crosses; spend covers the two inner levels.
        assert_eq!(cost_to_move_up(&asks), Some(122));
    }

    #[test]
    fn cost_up_without_depth_is_none() {
        let asks = [level(0.60, 100.0), level(0.62, 100.0)];
        assert_eq!(cost_to_move_up(&asks), None);
        assert_eq!(cost_to_move_up(&[]), None);
    }

    #[test]
    fn cost_down_walks_bids() {
        let bids = [level(0.58, 100.0), level(0.55, 100.0), level(0.53, 50.0)];
        // 0.53 == 0.58 - 0.05 crosses; spend = 58 + 55.
        assert_eq!(cost_to_move_down(&bids), Some(113));
    }

    #[test]
    fn cost_down_exhaustion_is_none() {
        let bids = [level(0.58, 500_000.0), level(0.54, 1_000_000.0)];
        assert_eq!(cost_to_move_down(&bids), None);
    }

    #[test]
    fn cost_both_sides_takes_cheaper_direction() {
        let book = OrderBook {
            bids: vec![level(0.58, 500_000.0), level(0.54, 1_000_000.0)],
            asks: vec![level(0.60, 500_000.0), level(0.66, 1_000_000.0)],
        };
        // Down is incomputable, up costs 300k.
        assert_eq!(cost_to_move_5c(&book), Some(300_000));

        let book = OrderBook {
            bids: vec![level(0.58, 100.0), level(0.52, 1.0)],
            asks: vec![level(0.60, 500_000.0), level(0.66, 1.0)],
        };
        // Down = 58, up = 300_000.
        assert_eq!(cost_to_move_5c(&book), Some(58));
    }

    #[test]
    fn cost_both_sides_none_when_neither_computable() {
        let book = OrderBook {
            bids: vec![level(0.58, 1.0)],
            asks: vec![level(0.60, 1.0)],
        };
        assert_eq!(cost_to_move_5c(&book), None);
        assert_eq!(cost_to_move_5c(&OrderBook::default()), None);
    }

    #[test]
    fn midpoint_of_best_levels() {
        let book = OrderBook {
            bids: vec![level(0.48, 10.0)],
            asks: vec![level(0.52, 10.0)],
        };
        assert_eq!(midpoint(&book), Some(0.50));
    }

    #[test]
    fn midpoint_none_when_one_side_empty() {
        let book = OrderBook {
            bids: vec![level(0.48, 10.0)],
            asks: vec![],
        };
        assert_eq!(midpoint(&book), None);
    }
}
