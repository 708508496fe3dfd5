//! Application configuration.
//!
//! A TOML file layered under `VMM_`-prefixed environment variables, with
//! `__` separating nesting levels:
//!
//! ```text
//! VMM_TRADE__SYMBOL=ETHUSDT
//! VMM_EXECUTOR__INTERVAL_MS=30000
//! VMM_GRACEFUL_SHUTDOWN_MS=10000
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use vmm_executor::SchedulerConfig;
use vmm_mm::MakerConfig;

use crate::error::{AppError, AppResult};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Service name, attached to startup logs.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Interval scheduler settings.
    #[serde(default)]
    pub executor: SchedulerConfig,

    /// Market maker settings.
    pub trade: MakerConfig,

    /// Exchange gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Upper bound on graceful shutdown, in milliseconds.
    #[serde(default = "default_graceful_shutdown_ms")]
    pub graceful_shutdown_ms: u64,
}

/// Gateway settings.
///
/// Only the paper venue ships with this workspace; `paper_tickers` seeds
/// its market data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Per-call deadline in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Artificial latency of the paper venue in milliseconds.
    #[serde(default)]
    pub paper_latency_ms: u64,

    /// Initial paper tickers.
    #[serde(default)]
    pub paper_tickers: Vec<PaperTickerConfig>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            paper_latency_ms: 0,
            paper_tickers: Vec::new(),
        }
    }
}

impl GatewayConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Seed ticker for the paper venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperTickerConfig {
    pub symbol: String,
    pub last_price: Decimal,
    pub best_bid: Decimal,
    pub best_ask: Decimal,
}

impl AppConfig {
    /// Load from a TOML file plus the process environment, then validate.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AppError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        Self::build(File::from(path), None)
    }

    /// Load from TOML text with explicit environment overrides.
    pub fn from_toml_str(content: &str, env: HashMap<String, String>) -> AppResult<Self> {
        Self::build(File::from_str(content, FileFormat::Toml), Some(env))
    }

    fn build<F>(file: F, env: Option<HashMap<String, String>>) -> AppResult<Self>
    where
        F: config::Source + Send + Sync + 'static,
    {
        let environment = Environment::with_prefix("VMM")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(env);

        let config: Self = Config::builder()
            .add_source(file)
            .add_source(environment)
            .build()
            .and_then(|c| c.try_deserialize::<Self>())
            .map_err(|e| AppError::Config(format!("Failed to load config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.service_name.trim().is_empty() {
            return Err(AppError::Config("service_name must not be empty".to_string()));
        }
        self.trade
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;
        self.executor
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))?;
        if self.gateway.request_timeout_ms == 0 {
            return Err(AppError::Config(
                "gateway.request_timeout_ms must be positive".to_string(),
            ));
        }
        if let Some(t) = self.gateway.paper_tickers.iter().find(|t| t.symbol.trim().is_empty()) {
            return Err(AppError::Config(format!(
                "paper ticker with empty symbol (last {})",
                t.last_price
            )));
        }
        Ok(())
    }

    pub fn graceful_shutdown(&self) -> Duration {
        Duration::from_millis(self.graceful_shutdown_ms)
    }
}

fn default_service_name() -> String {
    "trader".to_string()
}
fn default_graceful_shutdown_ms() -> u64 {
    5_000
}
fn default_request_timeout_ms() -> u64 {
    10_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const MINIMAL: &str = r#"
[trade]
symbol = "BTCUSDT"
trade_qty_min = "0.01"
trade_qty_max = "0.05"
"#;

    #[test]
    fn test_minimal_config_defaults() {
        let config = AppConfig::from_toml_str(MINIMAL, HashMap::new()).unwrap();
        assert_eq!(config.service_name, "trader");
        assert_eq!(config.executor.interval_ms, 60_000);
        assert_eq!(config.executor.iterations_per_interval, 2);
        assert_eq!(config.trade.symbol, "BTCUSDT");
        assert_eq!(config.trade.spread_margin_upper, dec!(1));
        assert_eq!(config.gateway.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.graceful_shutdown(), Duration::from_secs(5));
    }

    #[test]
    fn test_env_overrides_file() {
        let env = HashMap::from([
            ("VMM_TRADE__SYMBOL".to_string(), "ETHUSDT".to_string()),
            ("VMM_EXECUTOR__INTERVAL_MS".to_string(), "30000".to_string()),
            ("VMM_GRACEFUL_SHUTDOWN_MS".to_string(), "250".to_string()),
        ]);
        let config = AppConfig::from_toml_str(MINIMAL, env).unwrap();
        assert_eq!(config.trade.symbol, "ETHUSDT");
        assert_eq!(config.executor.interval_ms, 30_000);
        assert_eq!(config.graceful_shutdown(), Duration::from_millis(250));
    }

    #[test]
    fn test_paper_tickers_parsed() {
        let content = r#"
[trade]
symbol = "BTCUSDT"
trade_qty_min = "0.01"
trade_qty_max = "0.05"

[gateway]
request_timeout_ms = 500

[[gateway.paper_tickers]]
symbol = "BTCUSDT"
last_price = "100.5"
best_bid = "100"
best_ask = "101"
"#;
        let config = AppConfig::from_toml_str(content, HashMap::new()).unwrap();
        assert_eq!(config.gateway.request_timeout_ms, 500);
        assert_eq!(config.gateway.paper_tickers.len(), 1);
        assert_eq!(config.gateway.paper_tickers[0].best_ask, dec!(101));
    }

    #[test]
    fn test_missing_trade_section_rejected() {
        let result = AppConfig::from_toml_str("service_name = \"x\"", HashMap::new());
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_invalid_trade_rejected() {
        let env = HashMap::from([("VMM_TRADE__CANDLE_HEIGHT".to_string(), "1.5".to_string())]);
        let result = AppConfig::from_toml_str(MINIMAL, env);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_missing_file_rejected() {
        let result = AppConfig::load("does/not/exist.toml");
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
