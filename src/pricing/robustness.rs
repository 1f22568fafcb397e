//! Reportability policy: map cost-to-move into a verdict, then adjust for
//! how strong the selected pricing tier was.

use crate::config::{COST_CAUTION_FLOOR, COST_REPORTABLE_FLOOR};
use crate::models::Reportability;

/// Verdict from depth alone. A null cost means the book could not price the
/// manipulation at all, which is the weakest possible position.
pub fn raw_reportability(cost_to_move_5c: Option<i64>) -> Reportability {
    match cost_to_move_5c {
        None => Reportability::Fragile,
        Some(c) if c < COST_CAUTION_FLOOR => Reportability::Fragile,
        Some(c) if c < COST_REPORTABLE_FLOOR => Reportability::Caution,
        Some(_) => Reportability::Reportable,
    }
}

/// Tier adjustment: tier 1 passes through, tier 2 downgrades one level,
/// tier 3 caps at caution, tier 4 is always fragile.
pub fn tier_adjust(raw: Reportability, tier: u8) -> Reportability {
    match tier {
        1 => raw,
        2 => match raw {
            Reportability::Reportable => Reportability::Caution,
            Reportability::Caution => Reportability::Fragile,
            Reportability::Fragile => Reportability::Fragile,
        },
        3 => match raw {
            Reportability::Reportable => Reportability::Caution,
            other => other,
        },
        _ => Reportability::Fragile,
    }
}

/// Weakest link across venues: the smaller computable cost wins and names
/// its venue; "unknown" when neither side priced.
pub fn min_cost_and_weakest(
    polymarket: Option<i64>,
    kalshi: Option<i64>,
) -> (Option<i64>, &'static str) {
    match (polymarket, kalshi) {
        (Some(p), Some(k)) => {
            if k < p {
                (Some(k), "kalshi")
            } else {
                (Some(p), "polymarket")
            }
        }
        (Some(p), None) => (Some(p), "polymarket"),
        (None, Some(k)) => (Some(k), "kalshi"),
        (None, None) => (None, "unknown"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Reportability::{Caution, Fragile, Reportable};

    #[test]
    fn raw_thresholds() {
        assert_eq!(raw_reportability(None), Fragile);
        assert_eq!(raw_reportability(Some(0)), Fragile);
        assert_eq!(raw_reportability(Some(9_999)), Fragile);
        assert_eq!(raw_reportability(Some(10_000)), Caution);
        assert_eq!(raw_reportability(Some(99_999)), Caution);
        assert_eq!(raw_reportability(Some(100_000)), Reportable);
        assert_eq!(raw_reportability(Some(5_000_000)), Reportable);
    }

    #[test]
    fn tier_one_passes_through() {
        for r in [Fragile, Caution, Reportable] {
            assert_eq!(tier_adjust(r, 1), r);
        }
    }

    #[test]
    fn tier_two_downgrades_one_level() {
        assert_eq!(tier_adjust(Reportable, 2), Caution);
        assert_eq!(tier_adjust(Caution, 2), Fragile);
        assert_eq!(tier_adjust(Fragile, 2), Fragile);
    }

    #[test]
    fn tier_three_caps_at_caution() {
        assert_eq!(tier_adjust(Reportable, 3), Caution);
        assert_eq!(tier_adjust(Caution, 3), Caution);
        assert_eq!(tier_adjust(Fragile, 3), Fragile);
    }

    #[test]
    fn tier_four_forces_fragile() {
        assert_eq!(tier_adjust(Reportable, 4), Fragile);
        assert_eq!(tier_adjust(Caution, 4), Fragile);
        assert_eq!(tier_adjust(Fragile, 4), Fragile);
    }

    #[test]
    fn weakest_venue_is_the_argmin() {
        assert_eq!(
            min_cost_and_weakest(Some(250_000), Some(8_000)),
            (Some(8_000), "kalshi")
        );
        assert_eq!(
            min_cost_and_weakest(Some(8_000), Some(250_000)),
            (Some(8_000), "polymarket")
        );
        assert_eq!(
            min_cost_and_weakest(Some(42), None),
            (Some(42), "polymarket")
        );
        assert_eq!(min_cost_and_weakest(None, Some(42)), (Some(42), "kalshi"));
        assert_eq!(min_cost_and_weakest(None, None), (None, "unknown"));
    }
}
