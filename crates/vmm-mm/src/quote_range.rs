//! Quote range resolution.
//!
//! Derives the interval a two-sided quote may be placed in from three
//! inputs: the live spread, the last traded price and an oracle price.
//!
//! Envelopes (`h` = candle height):
//! - oracle: `[oracle * (1 - h/2), oracle * (1 + h/2)]`
//! - last: `[last * (1 - h/2), last * (1 + h/2)]`
//! - biased last: both last bounds scaled by `1 + dir * h/2`, where `dir`
//!   is +1 when the oracle sits at or above the last price, else -1
//!
//! Windows:
//! - effective spread: the raw spread, or `[bid, bid * (1 + h)]` when the
//!   ask is below the bid
//! - margin: `[bid + diff * lower, bid + diff * upper]` of the effective spread
//!
//! Tiers are tried in order and the first match wins. Each envelope tier
//! accepts the envelope whole if the window contains it, otherwise clips
//! to the side whose bound falls inside the window, using the envelope's
//! reference price as the inner edge. When no envelope touches either
//! window, the band is extended from the spread toward the oracle, and
//! failing that the effective spread itself is used.

use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;
use vmm_core::{Price, Spread};

/// Resolver parameters, taken from [`MakerConfig`](crate::MakerConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeParams {
    pub candle_height: Decimal,
    pub margin_lower: Decimal,
    pub margin_upper: Decimal,
}

/// Price band around a reference price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    pub lower: Price,
    pub upper: Price,
}

impl Envelope {
    /// `[center * (1 - h/2), center * (1 + h/2)]`.
    pub fn around(center: Price, candle_height: Decimal) -> Self {
        let half = candle_height / Decimal::TWO;
        Self {
            lower: center * (Decimal::ONE - half),
            upper: center * (Decimal::ONE + half),
        }
    }

    /// Both bounds scaled by `1 + direction * h/2`.
    pub fn biased(&self, direction: Decimal, candle_height: Decimal) -> Self {
        let factor = Decimal::ONE + direction * candle_height / Decimal::TWO;
        Self {
            lower: self.lower * factor,
            upper: self.upper * factor,
        }
    }
}

/// Which rule produced a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeTier {
    MarginOracle,
    MarginBiasedLast,
    MarginLast,
    SpreadOracle,
    SpreadBiasedLast,
    SpreadLast,
    Directional,
    RawSpread,
}

impl RangeTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MarginOracle => "margin_oracle",
            Self::MarginBiasedLast => "margin_biased_last",
            Self::MarginLast => "margin_last",
            Self::SpreadOracle => "spread_oracle",
            Self::SpreadBiasedLast => "spread_biased_last",
            Self::SpreadLast => "spread_last",
            Self::Directional => "directional",
            Self::RawSpread => "raw_spread",
        }
    }
}

impl fmt::Display for RangeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the envelope was fitted into the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    /// Window contains the whole envelope.
    Contained,
    /// Only the envelope's lower bound is in the window.
    LowerBound,
    /// Only the envelope's upper bound is in the window.
    UpperBound,
    /// Band extended upward from the bid.
    ExtendUp,
    /// Band extended downward from the ask.
    ExtendDown,
    /// Effective spread taken as is.
    Whole,
}

/// Resolved quote interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    pub min: Price,
    pub max: Price,
    pub tier: RangeTier,
    pub fit: Fit,
}

/// No legal quote range for the current market.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("{field} price must be positive, got {value}")]
    NonPositivePrice { field: &'static str, value: Price },

    #[error("cannot decide on a price range: min {min} > max {max} ({tier})")]
    Inverted {
        min: Price,
        max: Price,
        tier: RangeTier,
    },
}

impl RangeError {
    /// Metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NonPositivePrice { .. } => "non_positive_price",
            Self::Inverted { .. } => "inverted_range",
        }
    }
}

/// Resolve the quote interval for one iteration.
///
/// Fails with [`RangeError::Inverted`] when the selected tier yields
/// `min > max`, which happens under illiquid or strongly diverging markets.
pub fn resolve_quote_range(
    spread: Spread,
    last_price: Price,
    oracle_price: Price,
    params: &RangeParams,
) -> Result<PriceRange, RangeError> {
    if !oracle_price.is_positive() {
        return Err(RangeError::NonPositivePrice {
            field: "oracle",
            value: oracle_price,
        });
    }
    if !last_price.is_positive() {
        return Err(RangeError::NonPositivePrice {
            field: "last",
            value: last_price,
        });
    }

    let h = params.candle_height;
    let oracle_env = Envelope::around(oracle_price, h);
    let last_env = Envelope::around(last_price, h);
    let biased_env = last_env.biased(direction(oracle_price, last_price), h);

    let effective = effective_spread(spread, h);
    let margin = effective.margin(params.margin_lower, params.margin_upper);

    let tiers = [
        (RangeTier::MarginOracle, margin, oracle_env, oracle_price),
        (RangeTier::MarginBiasedLast, margin, biased_env, last_price),
        (RangeTier::MarginLast, margin, last_env, last_price),
        (RangeTier::SpreadOracle, effective, oracle_env, oracle_price),
        (RangeTier::SpreadBiasedLast, effective, biased_env, last_price),
        (RangeTier::SpreadLast, effective, last_env, last_price),
    ];

    let range = tiers
        .iter()
        .find_map(|&(tier, window, env, anchor)| {
            fit(window, env, anchor).map(|(min, max, fit)| PriceRange { min, max, tier, fit })
        })
        .unwrap_or_else(|| fallback(effective, oracle_price, oracle_env, h));

    if range.min > range.max {
        return Err(RangeError::Inverted {
            min: range.min,
            max: range.max,
            tier: range.tier,
        });
    }
    Ok(range)
}

/// +1 when the oracle is at or above the last price, else -1.
fn direction(oracle_price: Price, last_price: Price) -> Decimal {
    if oracle_price >= last_price {
        Decimal::ONE
    } else {
        Decimal::NEGATIVE_ONE
    }
}

/// Raw spread, or `[bid, bid * (1 + h)]` when degenerate.
fn effective_spread(spread: Spread, candle_height: Decimal) -> Spread {
    if spread.is_degenerate() {
        spread.with_ask(spread.bid * (Decimal::ONE + candle_height))
    } else {
        spread
    }
}

fn fit(window: Spread, env: Envelope, anchor: Price) -> Option<(Price, Price, Fit)> {
    match (window.contains(env.lower), window.contains(env.upper)) {
        (true, true) => Some((env.lower, env.upper, Fit::Contained)),
        (true, false) => Some((env.lower, window.ask.min(anchor), Fit::LowerBound)),
        (false, true) => Some((window.bid.max(anchor), env.upper, Fit::UpperBound)),
        (false, false) => None,
    }
}

fn fallback(spread: Spread, oracle_price: Price, oracle_env: Envelope, candle_height: Decimal) -> PriceRange {
    if spread.ask < oracle_price {
        PriceRange {
            min: spread.bid,
            max: (spread.bid * (Decimal::ONE + candle_height)).min(oracle_env.upper),
            tier: RangeTier::Directional,
            fit: Fit::ExtendUp,
        }
    } else if spread.bid > oracle_price {
        PriceRange {
            min: (spread.ask * (Decimal::ONE - candle_height)).max(oracle_env.lower),
            max: spread.ask,
            tier: RangeTier::Directional,
            fit: Fit::ExtendDown,
        }
    } else {
        PriceRange {
            min: spread.bid,
            max: spread.ask,
            tier: RangeTier::RawSpread,
            fit: Fit::Whole,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn p(d: Decimal) -> Price {
        Price::new(d)
    }

    fn params(h: Decimal) -> RangeParams {
        RangeParams {
            candle_height: h,
            margin_lower: dec!(0),
            margin_upper: dec!(1),
        }
    }

    fn spread(bid: Decimal, ask: Decimal) -> Spread {
        Spread::new(p(bid), p(ask))
    }

    #[test]
    fn test_oracle_above_spread_clips_low_side() {
        // oracle envelope [100.98, 103.02] only has its lower bound inside [100, 101]
        let range = resolve_quote_range(
            spread(dec!(100), dec!(101)),
            p(dec!(100.5)),
            p(dec!(102)),
            &params(dec!(0.02)),
        )
        .unwrap();

        assert_eq!(range.tier, RangeTier::MarginOracle);
        assert_eq!(range.fit, Fit::LowerBound);
        assert_eq!(range.min, p(dec!(100.98)));
        assert_eq!(range.max, p(dec!(101)));
    }

    #[test]
    fn test_oracle_envelope_contained() {
        let range = resolve_quote_range(
            spread(dec!(100), dec!(110)),
            p(dec!(104)),
            p(dec!(105)),
            &params(dec!(0.02)),
        )
        .unwrap();

        assert_eq!(range.tier, RangeTier::MarginOracle);
        assert_eq!(range.fit, Fit::Contained);
        assert_eq!(range.min, p(dec!(103.95)));
        assert_eq!(range.max, p(dec!(106.05)));
    }

    #[test]
    fn test_degenerate_spread_uses_synthetic_ask() {
        // no asks: ask reported as zero, synthetic ask = 50 * 1.02 = 51
        let range = resolve_quote_range(
            spread(dec!(50), dec!(0)),
            p(dec!(50)),
            p(dec!(50)),
            &params(dec!(0.02)),
        )
        .unwrap();

        assert_eq!(range.tier, RangeTier::MarginOracle);
        assert_eq!(range.fit, Fit::UpperBound);
        assert_eq!(range.min, p(dec!(50)));
        assert_eq!(range.max, p(dec!(50.5)));
    }

    #[test]
    fn test_biased_last_tier() {
        // oracle far above; last envelope shifted up by 0.5%
        let range = resolve_quote_range(
            spread(dec!(100), dec!(102)),
            p(dec!(101)),
            p(dec!(110)),
            &params(dec!(0.01)),
        )
        .unwrap();

        assert_eq!(range.tier, RangeTier::MarginBiasedLast);
        assert_eq!(range.fit, Fit::LowerBound);
        assert_eq!(range.min, p(dec!(100.997475)));
        assert_eq!(range.max, p(dec!(101)));
    }

    #[test]
    fn test_narrow_margin_falls_through_to_spread() {
        let range = resolve_quote_range(
            spread(dec!(100), dec!(110)),
            p(dec!(101)),
            p(dec!(101)),
            &RangeParams {
                candle_height: dec!(0.02),
                margin_lower: dec!(0.5),
                margin_upper: dec!(0.6),
            },
        )
        .unwrap();

        assert_eq!(range.tier, RangeTier::SpreadOracle);
        assert_eq!(range.fit, Fit::UpperBound);
        assert_eq!(range.min, p(dec!(101)));
        assert_eq!(range.max, p(dec!(102.01)));
    }

    #[test]
    fn test_directional_extension_up() {
        let range = resolve_quote_range(
            spread(dec!(100), dec!(101)),
            p(dec!(90)),
            p(dec!(120)),
            &params(dec!(0.02)),
        )
        .unwrap();

        assert_eq!(range.tier, RangeTier::Directional);
        assert_eq!(range.fit, Fit::ExtendUp);
        assert_eq!(range.min, p(dec!(100)));
        assert_eq!(range.max, p(dec!(102)));
    }

    #[test]
    fn test_directional_extension_down() {
        let range = resolve_quote_range(
            spread(dec!(100), dec!(101)),
            p(dec!(110)),
            p(dec!(80)),
            &params(dec!(0.02)),
        )
        .unwrap();

        assert_eq!(range.tier, RangeTier::Directional);
        assert_eq!(range.fit, Fit::ExtendDown);
        assert_eq!(range.min, p(dec!(98.98)));
        assert_eq!(range.max, p(dec!(101)));
    }

    #[test]
    fn test_raw_spread_last_resort() {
        // every envelope straddles the whole spread
        let range = resolve_quote_range(
            spread(dec!(100), dec!(101)),
            p(dec!(100.5)),
            p(dec!(100.5)),
            &params(dec!(0.5)),
        )
        .unwrap();

        assert_eq!(range.tier, RangeTier::RawSpread);
        assert_eq!(range.min, p(dec!(100)));
        assert_eq!(range.max, p(dec!(101)));
    }

    #[test]
    fn test_inverted_range_fails() {
        // oracle below last: biased envelope [90.25, 99.75], upper clip anchors at last=100
        let err = resolve_quote_range(
            spread(dec!(95), dec!(100)),
            p(dec!(100)),
            p(dec!(80)),
            &params(dec!(0.1)),
        )
        .unwrap_err();

        assert_eq!(
            err,
            RangeError::Inverted {
                min: p(dec!(100)),
                max: p(dec!(99.75)),
                tier: RangeTier::MarginBiasedLast,
            }
        );
        assert_eq!(err.as_str(), "inverted_range");
    }

    #[test]
    fn test_non_positive_prices_rejected() {
        let s = spread(dec!(100), dec!(101));
        let err = resolve_quote_range(s, p(dec!(100)), p(dec!(0)), &params(dec!(0.02))).unwrap_err();
        assert!(matches!(err, RangeError::NonPositivePrice { field: "oracle", .. }));

        let err = resolve_quote_range(s, p(dec!(-1)), p(dec!(100)), &params(dec!(0.02))).unwrap_err();
        assert!(matches!(err, RangeError::NonPositivePrice { field: "last", .. }));
    }

    #[test]
    fn test_direction_tie_is_upward() {
        assert_eq!(direction(p(dec!(100)), p(dec!(100))), Decimal::ONE);
        assert_eq!(direction(p(dec!(99)), p(dec!(100))), Decimal::NEGATIVE_ONE);
    }

    #[test]
    fn test_envelope_around() {
        let env = Envelope::around(p(dec!(200)), dec!(0.01));
        assert_eq!(env.lower, p(dec!(199)));
        assert_eq!(env.upper, p(dec!(201)));
    }

    fn cents(range: std::ops::Range<i64>) -> impl Strategy<Value = Decimal> {
        range.prop_map(|v| Decimal::new(v, 2))
    }

    proptest! {
        #[test]
        fn prop_resolved_range_is_ordered_and_bounded(
            bid in cents(0..1_000_000),
            width in cents(0..100_000),
            last in cents(1..2_000_000),
            oracle in cents(1..2_000_000),
            h_pct in 1i64..100,
        ) {
            let h = Decimal::new(h_pct, 2);
            let s = spread(bid, bid + width);
            if let Ok(range) = resolve_quote_range(s, p(last), p(oracle), &params(h)) {
                let oracle_env = Envelope::around(p(oracle), h);
                prop_assert!(range.min <= range.max);
                prop_assert!(range.min.inner() >= Decimal::ZERO);
                prop_assert!(range.min >= s.bid.min(oracle_env.lower));
                prop_assert!(range.max <= s.ask.max(oracle_env.upper));
            }
        }

        #[test]
        fn prop_degenerate_spread_bounded_by_synthetic_ask(
            bid in cents(1..1_000_000),
            gap in cents(1..1_000_000),
            last in cents(1..2_000_000),
            oracle in cents(1..2_000_000),
            h_pct in 1i64..100,
        ) {
            let h = Decimal::new(h_pct, 2);
            let s = spread(bid, (bid - gap).max(Decimal::ZERO));
            let synthetic_ask = p(bid * (Decimal::ONE + h));
            if let Ok(range) = resolve_quote_range(s, p(last), p(oracle), &params(h)) {
                let oracle_env = Envelope::around(p(oracle), h);
                prop_assert!(range.min <= range.max);
                prop_assert!(range.min.inner() >= Decimal::ZERO);
                prop_assert!(range.min >= s.bid.min(oracle_env.lower));
                prop_assert!(range.max <= synthetic_ask.max(oracle_env.upper));
            }
        }
    }
}
