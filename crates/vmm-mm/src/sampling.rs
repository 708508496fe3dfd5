//! Random price and quantity draws.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use vmm_core::{Price, Size};

/// Injected random source for quote draws.
///
/// Seeded explicitly for reproducible runs, or from OS entropy.
#[derive(Debug)]
pub struct QuoteSampler {
    rng: Mutex<StdRng>,
}

impl QuoteSampler {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// Uniform draw over the ticks of `decimals` lying strictly inside
    /// `(min, max)`.
    ///
    /// The result is already on the tick grid, so formatting it at
    /// `decimals` cannot move it onto or past either bound. Returns `None`
    /// when no tick fits.
    pub fn price_in_open(&self, min: Price, max: Price, decimals: u32) -> Option<Price> {
        let tick = Decimal::try_from_i128_with_scale(1, decimals).ok()?;
        let lowest = ((min.inner() / tick).floor() + Decimal::ONE).to_i128()?;
        let highest = ((max.inner() / tick).ceil() - Decimal::ONE).to_i128()?;
        if lowest > highest {
            return None;
        }
        let ticks = self.rng.lock().gen_range(lowest..=highest);
        let price = Decimal::try_from_i128_with_scale(ticks, decimals).ok()?;
        Some(Price::new(price))
    }

    /// Uniform draw from the closed interval `[min, max]`.
    pub fn qty_in_closed(&self, min: Size, max: Size) -> Size {
        if min >= max {
            return min;
        }
        let t: f64 = self.rng.lock().gen_range(0.0..=1.0);
        let t = Decimal::from_f64(t).unwrap_or(Decimal::ZERO);
        let width = max.inner() - min.inner();
        Size::new(min.inner() + width * t).clamp(min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_strictly_inside_on_tick_grid() {
        let sampler = QuoteSampler::new(Some(7));
        let (min, max) = (Price::new(dec!(100.98)), Price::new(dec!(101.05)));
        for _ in 0..10_000 {
            let price = sampler.price_in_open(min, max, 2).unwrap();
            assert!(price > min && price < max, "{price} outside ({min}, {max})");
            assert_eq!(price.to_fixed(2).parse::<Price>().unwrap(), price);
        }
    }

    #[test]
    fn test_price_single_interior_tick() {
        let sampler = QuoteSampler::new(Some(7));
        let (min, max) = (Price::new(dec!(100.98)), Price::new(dec!(101)));
        for _ in 0..1_000 {
            assert_eq!(sampler.price_in_open(min, max, 2), Some(Price::new(dec!(100.99))));
        }
    }

    #[test]
    fn test_price_unaligned_bounds() {
        let sampler = QuoteSampler::new(Some(3));
        let (min, max) = (Price::new(dec!(100.9875)), Price::new(dec!(101.0125)));
        for _ in 0..1_000 {
            let price = sampler.price_in_open(min, max, 2).unwrap();
            assert!(price >= Price::new(dec!(100.99)) && price <= Price::new(dec!(101.01)));
        }
    }

    #[test]
    fn test_price_empty_interval() {
        let sampler = QuoteSampler::new(Some(7));
        let p = Price::new(dec!(100));
        assert!(sampler.price_in_open(p, p, 4).is_none());
        assert!(sampler.price_in_open(p, Price::new(dec!(99)), 4).is_none());
        // adjacent ticks leave nothing strictly between them
        assert!(sampler
            .price_in_open(Price::new(dec!(100.98)), Price::new(dec!(100.99)), 2)
            .is_none());
        // narrower than one tick
        assert!(sampler
            .price_in_open(Price::new(dec!(100.98)), Price::new(dec!(101)), 1)
            .is_none());
    }

    #[test]
    fn test_qty_degenerate_bounds() {
        let sampler = QuoteSampler::new(Some(1));
        let one = Size::new(dec!(1.0));
        for _ in 0..10_000 {
            assert_eq!(sampler.qty_in_closed(one, one), one);
        }
    }

    #[test]
    fn test_qty_within_bounds() {
        let sampler = QuoteSampler::new(None);
        let (min, max) = (Size::new(dec!(0.1)), Size::new(dec!(0.5)));
        for _ in 0..10_000 {
            let qty = sampler.qty_in_closed(min, max);
            assert!(qty >= min && qty <= max);
        }
    }

    #[test]
    fn test_seed_is_reproducible() {
        let a = QuoteSampler::new(Some(42));
        let b = QuoteSampler::new(Some(42));
        let (min, max) = (Price::new(dec!(1)), Price::new(dec!(2)));
        for _ in 0..100 {
            assert_eq!(a.price_in_open(min, max, 4), b.price_in_open(min, max, 4));
        }
    }
}
