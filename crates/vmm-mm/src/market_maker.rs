//! Single-iteration trading orchestration.

use std::fmt;

use tracing::{debug, error, info, warn};
use vmm_core::{Order, OrderSide, Price, Size};
use vmm_gateway::DynGateway;
use vmm_telemetry::Metrics;

use crate::config::MakerConfig;
use crate::error::MmResult;
use crate::quote_range::{resolve_quote_range, RangeError, RangeTier};
use crate::sampling::QuoteSampler;

/// Why an iteration placed no orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No legal price range.
    Range(RangeError),
    /// Range resolved but has no interior point.
    EmptyRange { min: Price, max: Price },
    /// Drawn quantity rounds to zero at the configured precision.
    ZeroQuantity,
}

impl SkipReason {
    /// Metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Range(e) => e.as_str(),
            Self::EmptyRange { .. } => "empty_range",
            Self::ZeroQuantity => "zero_quantity",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Range(e) => write!(f, "{e}"),
            Self::EmptyRange { min, max } => write!(f, "empty price range ({min}, {max})"),
            Self::ZeroQuantity => f.write_str("quantity rounds to zero"),
        }
    }
}

/// Result of one trading iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeOutcome {
    /// Both legs placed at `price` / `qty` (formatted as sent).
    Placed {
        price: String,
        qty: String,
        tier: RangeTier,
    },
    /// Nothing placed; not an error.
    Skipped { reason: SkipReason },
}

/// Cancels, prices and places one sell/buy pair per iteration.
///
/// The trading and oracle gateways may be the same handle.
pub struct MarketMaker {
    config: MakerConfig,
    gateway: DynGateway,
    oracle: DynGateway,
    sampler: QuoteSampler,
}

impl MarketMaker {
    pub fn new(config: MakerConfig, gateway: DynGateway, oracle: DynGateway) -> MmResult<Self> {
        config.validate()?;
        let sampler = QuoteSampler::new(config.rng_seed);
        Ok(Self {
            config,
            gateway,
            oracle,
            sampler,
        })
    }

    pub fn config(&self) -> &MakerConfig {
        &self.config
    }

    /// Scheduler-facing iteration: [`trade_once`](Self::trade_once) with the outcome dropped.
    pub async fn do_iteration(&self) -> MmResult<()> {
        self.trade_once().await.map(|_| ())
    }

    /// Run one iteration.
    ///
    /// Any gateway error aborts the remaining steps. A sell that succeeds
    /// followed by a failed buy leaves the sell resting until the next
    /// iteration's cancel.
    pub async fn trade_once(&self) -> MmResult<TradeOutcome> {
        let symbol = self.config.symbol.as_str();

        self.gateway.cancel_all_orders(symbol).await.map_err(|e| {
            warn!(symbol, error = %e, "Failed to cancel open orders");
            e
        })?;

        let ticker = self.gateway.get_latest_ticker(symbol).await?;
        let oracle_symbol = self.config.oracle_symbol();
        let oracle_ticker = self.oracle.get_latest_ticker(oracle_symbol).await?;

        let spread = ticker.spread();
        let last_price = ticker.price();
        let oracle_price = oracle_ticker.price();

        let range = match resolve_quote_range(spread, last_price, oracle_price, &self.config.range_params()) {
            Ok(range) => range,
            Err(e) => return Ok(self.skip(SkipReason::Range(e))),
        };
        Metrics::quote_range_resolved(range.tier.as_str());
        debug!(
            symbol,
            bid = %spread.bid,
            ask = %spread.ask,
            last = %last_price,
            oracle = %oracle_price,
            min = %range.min,
            max = %range.max,
            tier = %range.tier,
            "Resolved quote range"
        );

        let Some(price) = self
            .sampler
            .price_in_open(range.min, range.max, self.config.price_decimals)
        else {
            return Ok(self.skip(SkipReason::EmptyRange {
                min: range.min,
                max: range.max,
            }));
        };
        let qty = self.sampler.qty_in_closed(
            Size::new(self.config.trade_qty_min),
            Size::new(self.config.trade_qty_max),
        );

        let price = price.to_fixed(self.config.price_decimals);
        let qty_str = qty.to_fixed(self.config.amount_decimals);
        if qty_str.parse::<Size>().map_or(true, |q| q.is_zero()) {
            return Ok(self.skip(SkipReason::ZeroQuantity));
        }

        self.place(OrderSide::Sell, &price, &qty_str).await?;
        if let Err(e) = self.place(OrderSide::Buy, &price, &qty_str).await {
            error!(
                symbol,
                price = %price,
                qty = %qty_str,
                "Buy leg failed after sell leg was placed; position unbalanced until next cancel"
            );
            return Err(e);
        }

        Ok(TradeOutcome::Placed {
            price,
            qty: qty_str,
            tier: range.tier,
        })
    }

    async fn place(&self, side: OrderSide, price: &str, qty: &str) -> MmResult<()> {
        let order = Order::new(&self.config.symbol, side, price, qty);
        let cloid = order.cloid.clone();
        match self.gateway.place_order(order).await {
            Ok(()) => {
                Metrics::order_submitted(side.as_str(), true);
                info!(symbol = %self.config.symbol, %side, price, qty, %cloid, "Successful order");
                Ok(())
            }
            Err(e) => {
                Metrics::order_submitted(side.as_str(), false);
                warn!(symbol = %self.config.symbol, %side, price, qty, %cloid, error = %e, "Failed order");
                Err(e.into())
            }
        }
    }

    fn skip(&self, reason: SkipReason) -> TradeOutcome {
        Metrics::quote_skipped(reason.as_str());
        info!(symbol = %self.config.symbol, reason = %reason, "Skipping iteration");
        TradeOutcome::Skipped { reason }
    }
}
