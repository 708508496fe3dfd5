//! Exchange gateway contract for the vmm bot.
//!
//! The market maker talks to venues only through [`ExchangeGateway`]:
//! - `get_latest_ticker` / `get_order_book`: market snapshots
//! - `place_order` / `cancel_all_orders`: order management
//!
//! Venue-specific REST clients implement the trait outside this workspace.
//! Two implementations live here:
//! - [`PaperGateway`]: in-memory venue for dry runs and tests
//! - [`TimeoutGateway`]: decorator enforcing a per-call deadline

pub mod error;
pub mod gateway;
pub mod paper;
pub mod timeout;

pub use error::{GatewayError, GatewayResult};
pub use gateway::{DynGateway, ExchangeGateway, GatewayCall};
pub use paper::PaperGateway;
pub use timeout::TimeoutGateway;
