//! Market snapshots: spread, ticker and order book.
//!
//! Snapshots are fetched fresh for every trading iteration and dropped
//! afterwards. Nothing here caches derived values: `Spread::diff` is always
//! recomputed from the current `ask`/`bid`.

use crate::error::{CoreError, Result};
use crate::{Price, Size};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Gap between best ask and best bid.
///
/// `ask >= bid` under normal conditions. A negative [`diff`](Self::diff)
/// (e.g. an empty ask side reported as zero) is a recognized degenerate
/// state, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spread {
    /// Best bid price.
    pub bid: Price,
    /// Best ask price.
    pub ask: Price,
}

impl Spread {
    /// Create a spread from bid and ask.
    pub fn new(bid: Price, ask: Price) -> Self {
        Self { bid, ask }
    }

    /// `ask - bid`.
    #[inline]
    pub fn diff(&self) -> Decimal {
        self.ask.inner() - self.bid.inner()
    }

    /// True when the ask sits below the bid (missing or crossed far side).
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.diff() < Decimal::ZERO
    }

    /// Copy of this spread with a substituted ask.
    pub fn with_ask(&self, ask: Price) -> Self {
        Self { bid: self.bid, ask }
    }

    /// Sub-range of the spread carved out by fractional margins.
    ///
    /// Returns `[bid + diff * lower, bid + diff * upper]`.
    pub fn margin(&self, lower: Decimal, upper: Decimal) -> Self {
        let diff = self.diff();
        Self {
            bid: Price::new(self.bid.inner() + diff * lower),
            ask: Price::new(self.bid.inner() + diff * upper),
        }
    }

    /// Inclusive containment check.
    #[inline]
    pub fn contains(&self, price: Price) -> bool {
        self.bid <= price && price <= self.ask
    }
}

/// Read-only ticker snapshot from a gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticker {
    /// Trading symbol (e.g. "BTCUSDT").
    pub symbol: String,
    /// Last traded price.
    pub last_price: Price,
    /// Best ask price (zero when the ask side is empty).
    pub best_ask: Price,
    /// Best bid price (zero when the bid side is empty).
    pub best_bid: Price,
}

impl Ticker {
    /// Create a ticker from typed prices.
    pub fn new(symbol: impl Into<String>, last_price: Price, best_bid: Price, best_ask: Price) -> Self {
        Self {
            symbol: symbol.into(),
            last_price,
            best_ask,
            best_bid,
        }
    }

    /// Build a ticker from the string fields exchanges return.
    ///
    /// Empty strings are treated as an empty book side (zero).
    pub fn parse(symbol: impl Into<String>, last_price: &str, best_bid: &str, best_ask: &str) -> Result<Self> {
        Ok(Self {
            symbol: symbol.into(),
            last_price: parse_price("last", last_price)?,
            best_ask: parse_price("ask", best_ask)?,
            best_bid: parse_price("bid", best_bid)?,
        })
    }

    /// Current spread.
    pub fn spread(&self) -> Spread {
        Spread::new(self.best_bid, self.best_ask)
    }

    /// Last traded price.
    pub fn price(&self) -> Price {
        self.last_price
    }
}

fn parse_price(field: &str, raw: &str) -> Result<Price> {
    if raw.trim().is_empty() {
        return Ok(Price::ZERO);
    }
    raw.parse()
        .map_err(|_| CoreError::InvalidPrice(format!("failed to parse {field} price: {raw:?}")))
}

/// One price level of an order book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: Price,
    pub size: Size,
}

impl BookLevel {
    pub fn new(price: Price, size: Size) -> Self {
        Self { price, size }
    }
}

/// Top-of-book snapshot.
///
/// `asks` are ordered by increasing price, `bids` by decreasing price, so
/// the best level of each side is its head.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderBook {
    pub symbol: String,
    pub asks: Vec<BookLevel>,
    pub bids: Vec<BookLevel>,
}

impl OrderBook {
    /// Create an order book from typed levels.
    pub fn new(symbol: impl Into<String>, asks: Vec<BookLevel>, bids: Vec<BookLevel>) -> Self {
        Self {
            symbol: symbol.into(),
            asks,
            bids,
        }
    }

    /// Build a book from `[price, qty, ...]` string levels.
    ///
    /// Levels with fewer than two fields or unparsable numbers are rejected.
    pub fn from_levels<S: AsRef<str>>(
        symbol: impl Into<String>,
        asks: &[Vec<S>],
        bids: &[Vec<S>],
    ) -> Result<Self> {
        Ok(Self {
            symbol: symbol.into(),
            asks: parse_levels("ask", asks)?,
            bids: parse_levels("bid", bids)?,
        })
    }

    /// Best ask price, or zero when there are no asks.
    pub fn best_ask(&self) -> Price {
        self.asks.first().map(|l| l.price).unwrap_or(Price::ZERO)
    }

    /// Best bid price, or zero when there are no bids.
    pub fn best_bid(&self) -> Price {
        self.bids.first().map(|l| l.price).unwrap_or(Price::ZERO)
    }

    /// Spread between the best levels.
    pub fn spread(&self) -> Spread {
        Spread::new(self.best_bid(), self.best_ask())
    }
}

fn parse_levels<S: AsRef<str>>(side: &str, raw: &[Vec<S>]) -> Result<Vec<BookLevel>> {
    raw.iter()
        .enumerate()
        .map(|(i, level)| {
            if level.len() < 2 {
                return Err(CoreError::InvalidOrderBook(format!(
                    "{side} level {i} has {} fields, expected [price, qty]",
                    level.len()
                )));
            }
            let price: Price = level[0].as_ref().parse().map_err(|_| {
                CoreError::InvalidOrderBook(format!("{side} level {i}: bad price {:?}", level[0].as_ref()))
            })?;
            let size: Size = level[1].as_ref().parse().map_err(|_| {
                CoreError::InvalidOrderBook(format!("{side} level {i}: bad qty {:?}", level[1].as_ref()))
            })?;
            Ok(BookLevel::new(price, size))
        })
        .collect()
}
