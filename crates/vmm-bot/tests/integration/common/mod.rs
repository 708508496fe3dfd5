//! Shared fixtures for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use rust_decimal_macros::dec;
use vmm_bot::{AppConfig, GatewayConfig};
use vmm_core::{Order, OrderBook, Price, Ticker};
use vmm_executor::SchedulerConfig;
use vmm_gateway::{DynGateway, ExchangeGateway, GatewayResult, PaperGateway};
use vmm_mm::MakerConfig;

pub const SYMBOL: &str = "BTCUSDT";
pub const ORACLE_SYMBOL: &str = "BTCUSDC";

/// Paper venue with a 100/101 book, last 100.5 and an oracle at 102.
pub fn paper_venue() -> PaperGateway {
    let venue = PaperGateway::new();
    seed(&venue);
    venue
}

pub fn seed(venue: &PaperGateway) {
    venue.set_ticker(Ticker::new(
        SYMBOL,
        Price::new(dec!(100.5)),
        Price::new(dec!(100)),
        Price::new(dec!(101)),
    ));
    venue.set_ticker(Ticker::new(
        ORACLE_SYMBOL,
        Price::new(dec!(102)),
        Price::new(dec!(101.9)),
        Price::new(dec!(102.1)),
    ));
}

pub fn app_config(interval_ms: u64, iterations: u32) -> AppConfig {
    let mut trade = MakerConfig::new(SYMBOL, dec!(0.1), dec!(0.5));
    trade.oracle_symbol = Some(ORACLE_SYMBOL.to_string());
    trade.candle_height = dec!(0.02);
    trade.rng_seed = Some(3);

    AppConfig {
        service_name: "trader-test".to_string(),
        executor: SchedulerConfig {
            interval_ms,
            iterations_per_interval: iterations,
            adaptive_jitter: true,
            rng_seed: Some(5),
        },
        trade,
        gateway: GatewayConfig::default(),
        graceful_shutdown_ms: 1_000,
    }
}

/// Counts calls that reach the wrapped gateway, whether or not they complete.
pub struct CountingGateway {
    inner: DynGateway,
    cancels: AtomicUsize,
    orders: AtomicUsize,
}

impl CountingGateway {
    pub fn new(inner: DynGateway) -> Self {
        Self {
            inner,
            cancels: AtomicUsize::new(0),
            orders: AtomicUsize::new(0),
        }
    }

    pub fn cancel_attempts(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    pub fn order_attempts(&self) -> usize {
        self.orders.load(Ordering::SeqCst)
    }
}

impl ExchangeGateway for CountingGateway {
    fn get_latest_ticker<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, GatewayResult<Ticker>> {
        self.inner.get_latest_ticker(symbol)
    }

    fn get_order_book<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, GatewayResult<OrderBook>> {
        self.inner.get_order_book(symbol)
    }

    fn place_order(&self, order: Order) -> BoxFuture<'_, GatewayResult<()>> {
        self.orders.fetch_add(1, Ordering::SeqCst);
        self.inner.place_order(order)
    }

    fn cancel_all_orders<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, GatewayResult<()>> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        self.inner.cancel_all_orders(symbol)
    }
}

/// Wrap a concrete gateway as a shared handle.
pub fn shared<G: ExchangeGateway + 'static>(gateway: &Arc<G>) -> DynGateway {
    gateway.clone()
}
