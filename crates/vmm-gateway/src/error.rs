//! Gateway error types.

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by an exchange gateway.
///
/// Callers in the trading core do not branch on the variant: any error
/// aborts the current iteration. Retry policy, if any, belongs to the
/// gateway implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Exchange rejected request (code {code}): {message}")]
    Rejected { code: i64, message: String },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Response parse error: {0}")]
    Parse(String),

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),
}

impl From<vmm_core::CoreError> for GatewayError {
    fn from(e: vmm_core::CoreError) -> Self {
        Self::Parse(e.to_string())
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
