//! Market maker configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{MmError, MmResult};
use crate::quote_range::RangeParams;

/// Finest tick or lot precision accepted.
const MAX_DECIMALS: u32 = 18;

/// Market maker configuration. Immutable after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakerConfig {
    /// Traded symbol (e.g. "BTCUSDT").
    pub symbol: String,

    /// Symbol whose last price serves as the oracle.
    /// Unset = same as `symbol`.
    #[serde(default)]
    pub oracle_symbol: Option<String>,

    /// Envelope width around a reference price, as a fraction (0.01 = 1%).
    #[serde(default = "default_candle_height")]
    pub candle_height: Decimal,

    /// Lower bound of the spread sub-range, as a fraction of the spread.
    #[serde(default = "default_spread_margin_lower")]
    pub spread_margin_lower: Decimal,

    /// Upper bound of the spread sub-range, as a fraction of the spread.
    #[serde(default = "default_spread_margin_upper")]
    pub spread_margin_upper: Decimal,

    /// Minimum order quantity.
    pub trade_qty_min: Decimal,

    /// Maximum order quantity.
    pub trade_qty_max: Decimal,

    /// Decimal places for order prices.
    #[serde(default = "default_price_decimals")]
    pub price_decimals: u32,

    /// Decimal places for order quantities.
    #[serde(default = "default_amount_decimals")]
    pub amount_decimals: u32,

    /// Seed for price/quantity draws. Unset = seeded from entropy.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl MakerConfig {
    /// Config with defaults for everything but the symbol and quantity bounds.
    pub fn new(symbol: impl Into<String>, trade_qty_min: Decimal, trade_qty_max: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            oracle_symbol: None,
            candle_height: default_candle_height(),
            spread_margin_lower: default_spread_margin_lower(),
            spread_margin_upper: default_spread_margin_upper(),
            trade_qty_min,
            trade_qty_max,
            price_decimals: default_price_decimals(),
            amount_decimals: default_amount_decimals(),
            rng_seed: None,
        }
    }

    /// Oracle symbol, falling back to the traded symbol.
    pub fn oracle_symbol(&self) -> &str {
        self.oracle_symbol.as_deref().unwrap_or(&self.symbol)
    }

    /// Parameters handed to the range resolver.
    pub fn range_params(&self) -> RangeParams {
        RangeParams {
            candle_height: self.candle_height,
            margin_lower: self.spread_margin_lower,
            margin_upper: self.spread_margin_upper,
        }
    }

    pub fn validate(&self) -> MmResult<()> {
        if self.symbol.trim().is_empty() {
            return Err(MmError::Config("symbol must not be empty".to_string()));
        }
        if matches!(&self.oracle_symbol, Some(s) if s.trim().is_empty()) {
            return Err(MmError::Config("oracle_symbol must not be empty when set".to_string()));
        }
        if self.candle_height <= Decimal::ZERO || self.candle_height >= Decimal::ONE {
            return Err(MmError::Config(format!(
                "candle_height must be in (0, 1), got {}",
                self.candle_height
            )));
        }
        let unit = Decimal::ZERO..=Decimal::ONE;
        if !unit.contains(&self.spread_margin_lower) || !unit.contains(&self.spread_margin_upper) {
            return Err(MmError::Config(format!(
                "spread margins must be in [0, 1], got [{}, {}]",
                self.spread_margin_lower, self.spread_margin_upper
            )));
        }
        if self.spread_margin_lower > self.spread_margin_upper {
            return Err(MmError::Config(format!(
                "spread_margin_lower {} exceeds spread_margin_upper {}",
                self.spread_margin_lower, self.spread_margin_upper
            )));
        }
        if self.price_decimals > MAX_DECIMALS || self.amount_decimals > MAX_DECIMALS {
            return Err(MmError::Config(format!(
                "price_decimals and amount_decimals must be at most {MAX_DECIMALS}, got {} and {}",
                self.price_decimals, self.amount_decimals
            )));
        }
        if self.trade_qty_min <= Decimal::ZERO {
            return Err(MmError::Config(format!(
                "trade_qty_min must be positive, got {}",
                self.trade_qty_min
            )));
        }
        if self.trade_qty_min > self.trade_qty_max {
            return Err(MmError::Config(format!(
                "trade_qty_min {} exceeds trade_qty_max {}",
                self.trade_qty_min, self.trade_qty_max
            )));
        }
        Ok(())
    }
}

fn default_candle_height() -> Decimal {
    dec!(0.01)
}
fn default_spread_margin_lower() -> Decimal {
    Decimal::ZERO
}
fn default_spread_margin_upper() -> Decimal {
    Decimal::ONE
}
fn default_price_decimals() -> u32 {
    4
}
fn default_amount_decimals() -> u32 {
    4
}
