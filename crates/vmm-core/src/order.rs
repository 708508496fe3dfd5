//! Order value objects.
//!
//! Orders are fire-and-forget: they are built once per leg, handed to the
//! gateway and never mutated. Price and quantity are already formatted to
//! the venue's precision when an `Order` is constructed.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Lowercase label used for logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client order ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientOrderId(String);

impl ClientOrderId {
    /// Create a new unique client order ID.
    ///
    /// Format: `vmm_{timestamp_ms}_{uuid_short}`
    pub fn new() -> Self {
        let ts = chrono::Utc::now().timestamp_millis();
        let uuid_short = &Uuid::new_v4().simple().to_string()[..8];
        Self(format!("vmm_{ts}_{uuid_short}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClientOrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ClientOrderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Limit order handed to an exchange gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub cloid: ClientOrderId,
    pub symbol: String,
    pub side: OrderSide,
    /// Price formatted to tick precision.
    pub price: String,
    /// Quantity formatted to lot precision.
    pub qty: String,
}

impl Order {
    pub fn new(
        symbol: impl Into<String>,
        side: OrderSide,
        price: impl Into<String>,
        qty: impl Into<String>,
    ) -> Self {
        Self {
            cloid: ClientOrderId::new(),
            symbol: symbol.into(),
            side,
            price: price.into(),
            qty: qty.into(),
        }
    }
}
