//! vmm two-sided quoting bot.
//!
//! Wires a [`MarketMaker`](vmm_mm::MarketMaker) into an
//! [`IntervalScheduler`](vmm_executor::IntervalScheduler) behind the
//! [`TraderService`] start/shutdown contract.

pub mod config;
pub mod error;
pub mod service;

pub use config::{AppConfig, GatewayConfig, PaperTickerConfig};
pub use error::{AppError, AppResult};
pub use service::{build_paper_gateway, MarketMakerTask, TraderService};
