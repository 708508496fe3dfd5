//! In-memory paper venue.
//!
//! Holds per-symbol tickers and books set by the caller, records every
//! order and cancel, and crosses incoming orders against resting orders of
//! the same symbol so that a sell-then-buy pair at one price produces a
//! fill and moves the last price. Failures can be scripted per call.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use tracing::{debug, trace};
use vmm_core::{BookLevel, Order, OrderBook, OrderSide, Price, Size, Ticker};

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::{ExchangeGateway, GatewayCall};

/// Rejection code for malformed order fields.
const REJECT_BAD_ORDER: i64 = 400;

/// Entries kept per history (orders, fills, cancels); oldest dropped first.
pub const HISTORY_LIMIT: usize = 10_000;

/// Order resting on the paper book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestingOrder {
    pub order: Order,
    pub price: Price,
    pub remaining: Size,
}

/// Match between an incoming order and a resting one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperFill {
    pub symbol: String,
    pub price: Price,
    pub size: Size,
    /// Side of the incoming (taker) order.
    pub taker_side: OrderSide,
}

/// In-memory [`ExchangeGateway`] implementation.
#[derive(Debug, Default)]
pub struct PaperGateway {
    tickers: Mutex<HashMap<String, Ticker>>,
    books: Mutex<HashMap<String, OrderBook>>,
    placed: Mutex<VecDeque<Order>>,
    resting: Mutex<HashMap<String, Vec<RestingOrder>>>,
    fills: Mutex<VecDeque<PaperFill>>,
    cancels: Mutex<VecDeque<String>>,
    scripted: Mutex<HashMap<GatewayCall, VecDeque<GatewayResult<()>>>>,
    latency: Option<Duration>,
}

impl PaperGateway {
    /// Create an empty paper venue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Install or replace the ticker for its symbol.
    pub fn set_ticker(&self, ticker: Ticker) {
        self.tickers.lock().insert(ticker.symbol.clone(), ticker);
    }

    /// Install or replace the order book for its symbol.
    pub fn set_order_book(&self, book: OrderBook) {
        self.books.lock().insert(book.symbol.clone(), book);
    }

    /// Queue an outcome for a future invocation of `call`.
    ///
    /// Outcomes are consumed in FIFO order, one per call. `Ok(())` lets the
    /// call through to the paper venue; an error is returned as is.
    pub fn push_outcome(&self, call: GatewayCall, outcome: GatewayResult<()>) {
        self.scripted.lock().entry(call).or_default().push_back(outcome);
    }

    /// Queue an error for the next invocation of `call`.
    pub fn fail_next(&self, call: GatewayCall, error: GatewayError) {
        self.push_outcome(call, Err(error));
    }

    /// Accepted orders in submission order, the latest [`HISTORY_LIMIT`].
    pub fn placed_orders(&self) -> Vec<Order> {
        self.placed.lock().iter().cloned().collect()
    }

    /// Orders still resting for `symbol`.
    pub fn resting_orders(&self, symbol: &str) -> Vec<RestingOrder> {
        self.resting.lock().get(symbol).cloned().unwrap_or_default()
    }

    /// Fills produced so far, the latest [`HISTORY_LIMIT`].
    pub fn fills(&self) -> Vec<PaperFill> {
        self.fills.lock().iter().cloned().collect()
    }

    /// Symbols passed to `cancel_all_orders`, in call order, the latest
    /// [`HISTORY_LIMIT`].
    pub fn cancel_calls(&self) -> Vec<String> {
        self.cancels.lock().iter().cloned().collect()
    }

    async fn enter(&self, call: GatewayCall) -> GatewayResult<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let scripted = self
            .scripted
            .lock()
            .get_mut(&call)
            .and_then(VecDeque::pop_front);
        match scripted {
            Some(Err(err)) => {
                debug!(call = %call, error = %err, "Paper gateway returning scripted error");
                Err(err)
            }
            Some(Ok(())) | None => Ok(()),
        }
    }

    fn ticker(&self, symbol: &str) -> GatewayResult<Ticker> {
        self.tickers
            .lock()
            .get(symbol)
            .cloned()
            .ok_or_else(|| GatewayError::UnknownSymbol(symbol.to_string()))
    }

    fn book(&self, symbol: &str) -> GatewayResult<OrderBook> {
        if let Some(book) = self.books.lock().get(symbol) {
            return Ok(book.clone());
        }
        // Without an explicit book, expose the ticker's top of book.
        let ticker = self.ticker(symbol)?;
        let level = |p: Price| {
            if p.is_zero() {
                Vec::new()
            } else {
                vec![BookLevel::new(p, Size::ZERO)]
            }
        };
        Ok(OrderBook::new(
            symbol,
            level(ticker.best_ask),
            level(ticker.best_bid),
        ))
    }

    fn accept(&self, order: Order) -> GatewayResult<()> {
        let price: Price = order.price.parse().map_err(|_| GatewayError::Rejected {
            code: REJECT_BAD_ORDER,
            message: format!("invalid price {:?}", order.price),
        })?;
        let size: Size = order.qty.parse().map_err(|_| GatewayError::Rejected {
            code: REJECT_BAD_ORDER,
            message: format!("invalid qty {:?}", order.qty),
        })?;
        if !price.is_positive() || size.is_zero() {
            return Err(GatewayError::Rejected {
                code: REJECT_BAD_ORDER,
                message: format!("non-positive price or qty: {} @ {}", order.qty, order.price),
            });
        }

        record(&self.placed, order.clone());

        let mut remaining = size;
        let mut last_fill = None;
        {
            let mut resting = self.resting.lock();
            let book = resting.entry(order.symbol.clone()).or_default();
            book.retain_mut(|maker| {
                if remaining.is_zero() || maker.order.side == order.side {
                    return true;
                }
                let crosses = match order.side {
                    OrderSide::Buy => maker.price <= price,
                    OrderSide::Sell => maker.price >= price,
                };
                if !crosses {
                    return true;
                }
                let filled = remaining.min(maker.remaining);
                remaining = remaining - filled;
                maker.remaining = maker.remaining - filled;
                record(
                    &self.fills,
                    PaperFill {
                        symbol: order.symbol.clone(),
                        price: maker.price,
                        size: filled,
                        taker_side: order.side,
                    },
                );
                last_fill = Some(maker.price);
                !maker.remaining.is_zero()
            });
            if !remaining.is_zero() {
                book.push(RestingOrder {
                    order: order.clone(),
                    price,
                    remaining,
                });
            }
        }

        if let Some(fill_price) = last_fill {
            if let Some(ticker) = self.tickers.lock().get_mut(&order.symbol) {
                ticker.last_price = fill_price;
            }
            trace!(symbol = %order.symbol, price = %fill_price, "Paper fill");
        }
        Ok(())
    }
}

fn record<T>(history: &Mutex<VecDeque<T>>, entry: T) {
    let mut history = history.lock();
    if history.len() == HISTORY_LIMIT {
        history.pop_front();
    }
    history.push_back(entry);
}

impl ExchangeGateway for PaperGateway {
    fn get_latest_ticker<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, GatewayResult<Ticker>> {
        Box::pin(async move {
            self.enter(GatewayCall::GetLatestTicker).await?;
            self.ticker(symbol)
        })
    }

    fn get_order_book<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, GatewayResult<OrderBook>> {
        Box::pin(async move {
            self.enter(GatewayCall::GetOrderBook).await?;
            self.book(symbol)
        })
    }

    fn place_order(&self, order: Order) -> BoxFuture<'_, GatewayResult<()>> {
        Box::pin(async move {
            self.enter(GatewayCall::PlaceOrder).await?;
            debug!(
                cloid = %order.cloid,
                symbol = %order.symbol,
                side = %order.side,
                price = %order.price,
                qty = %order.qty,
                "Paper order"
            );
            self.accept(order)
        })
    }

    fn cancel_all_orders<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, GatewayResult<()>> {
        Box::pin(async move {
            self.enter(GatewayCall::CancelAllOrders).await?;
            record(&self.cancels, symbol.to_string());
            let removed = self.resting.lock().remove(symbol).map_or(0, |v| v.len());
            debug!(symbol, removed, "Paper cancel all");
            Ok(())
        })
    }
}
