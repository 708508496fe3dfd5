//! Core domain types for the volume market-making bot.
//!
//! This crate provides the data model shared by every other crate:
//! - `Price`, `Size`: precision-safe numeric types with fixed-decimal formatting
//! - `Spread`, `Ticker`, `OrderBook`: per-iteration market snapshots
//! - `Order`, `OrderSide`, `ClientOrderId`: order value objects

pub mod decimal;
pub mod error;
pub mod market;
pub mod order;

pub use decimal::{format_fixed, Price, Size};
pub use error::{CoreError, Result};
pub use market::{BookLevel, OrderBook, Spread, Ticker};
pub use order::{ClientOrderId, Order, OrderSide};
