//! Market maker error types.

use thiserror::Error;
use vmm_gateway::GatewayError;

#[derive(Debug, Error)]
pub enum MmError {
    #[error("Invalid maker config: {0}")]
    Config(String),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

pub type MmResult<T> = Result<T, MmError>;
