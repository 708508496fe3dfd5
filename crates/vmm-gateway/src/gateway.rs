//! The exchange gateway trait.

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use vmm_core::{Order, OrderBook, Ticker};

use crate::error::GatewayResult;

/// Operations the market maker needs from a venue.
///
/// All calls are awaited to completion by the caller. Implementations own
/// transport, signing, response parsing and any retry/timeout policy.
pub trait ExchangeGateway: Send + Sync {
    /// Latest ticker (last price plus best bid/ask) for `symbol`.
    fn get_latest_ticker<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, GatewayResult<Ticker>>;

    /// Top-of-book snapshot for `symbol`.
    fn get_order_book<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, GatewayResult<OrderBook>>;

    /// Submit a limit order.
    fn place_order(&self, order: Order) -> BoxFuture<'_, GatewayResult<()>>;

    /// Cancel every resting order for `symbol`.
    fn cancel_all_orders<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, GatewayResult<()>>;
}

/// Arc wrapper for gateway trait objects.
pub type DynGateway = Arc<dyn ExchangeGateway>;

/// Gateway operation identifier, used for logging and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayCall {
    GetLatestTicker,
    GetOrderBook,
    PlaceOrder,
    CancelAllOrders,
}

impl GatewayCall {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetLatestTicker => "get_latest_ticker",
            Self::GetOrderBook => "get_order_book",
            Self::PlaceOrder => "place_order",
            Self::CancelAllOrders => "cancel_all_orders",
        }
    }
}

impl fmt::Display for GatewayCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
