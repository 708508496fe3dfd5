//! Per-call deadline decorator.

use std::future::Future;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tracing::warn;
use vmm_core::{Order, OrderBook, Ticker};

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{DynGateway, ExchangeGateway, GatewayCall};

/// Wraps a gateway so that no call outlives `timeout`.
///
/// An expired call resolves to [`GatewayError::Timeout`]; the inner future
/// is dropped.
pub struct TimeoutGateway {
    inner: DynGateway,
    timeout: Duration,
}

impl TimeoutGateway {
    pub fn new(inner: DynGateway, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn guard<T>(
        &self,
        call: GatewayCall,
        fut: impl Future<Output = GatewayResult<T>>,
    ) -> GatewayResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(call = %call, timeout_ms = self.timeout.as_millis() as u64, "Gateway call timed out");
                Err(GatewayError::Timeout(self.timeout))
            }
        }
    }
}

impl ExchangeGateway for TimeoutGateway {
    fn get_latest_ticker<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, GatewayResult<Ticker>> {
        Box::pin(self.guard(GatewayCall::GetLatestTicker, self.inner.get_latest_ticker(symbol)))
    }

    fn get_order_book<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, GatewayResult<OrderBook>> {
        Box::pin(self.guard(GatewayCall::GetOrderBook, self.inner.get_order_book(symbol)))
    }

    fn place_order(&self, order: Order) -> BoxFuture<'_, GatewayResult<()>> {
        Box::pin(self.guard(GatewayCall::PlaceOrder, self.inner.place_order(order)))
    }

    fn cancel_all_orders<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, GatewayResult<()>> {
        Box::pin(self.guard(GatewayCall::CancelAllOrders, self.inner.cancel_all_orders(symbol)))
    }
}
