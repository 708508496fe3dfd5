//! Market making core for the vmm bot.
//!
//! One trading iteration cancels resting orders, resolves a legal price
//! range from the live spread, the last price and an oracle price, then
//! places a sell and a buy at one randomly drawn price.
//!
//! - [`resolve_quote_range`]: tiered range resolution (pure)
//! - [`QuoteSampler`]: injected random source for price and quantity draws
//! - [`MarketMaker`]: gateway orchestration for a single iteration

pub mod config;
pub mod error;
pub mod market_maker;
pub mod quote_range;
pub mod sampling;

pub use config::MakerConfig;
pub use error::{MmError, MmResult};
pub use market_maker::{MarketMaker, SkipReason, TradeOutcome};
pub use quote_range::{resolve_quote_range, Envelope, Fit, PriceRange, RangeError, RangeParams, RangeTier};
pub use sampling::QuoteSampler;
