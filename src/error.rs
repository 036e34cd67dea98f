//! Error taxonomy shared by every component.
//!
//! Metadata that cannot be resolved is not an error: the resolver returns
//! `None` instead.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HerbTraceError>;

#[derive(Debug, Error)]
pub enum HerbTraceError {
    /// No read endpoint could be constructed.
    #[error("no read endpoint could be opened (tried {attempted})")]
    GatewayUnavailable { attempted: usize },

    #[error("no wallet available: {0}")]
    WalletUnavailable(String),

    #[error("wallet connection rejected: {0}")]
    WalletConnectionRejected(String),

    /// A contract read or write reverted, or its transport failed.
    #[error("contract call {call} failed: {reason}")]
    ContractCallFailed { call: String, reason: String },

    #[error("storage upload failed: {0}")]
    StorageUploadFailed(String),

    #[error("batch #{0} not found on chain")]
    NotFound(u64),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl HerbTraceError {
    pub fn contract(call: &str, reason: impl ToString) -> Self {
        HerbTraceError::ContractCallFailed {
            call: call.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Short machine-readable tag used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            HerbTraceError::GatewayUnavailable { .. } => "gateway_unavailable",
            HerbTraceError::WalletUnavailable(_) => "wallet_unavailable",
            HerbTraceError::WalletConnectionRejected(_) => "wallet_rejected",
            HerbTraceError::ContractCallFailed { .. } => "contract_call_failed",
            HerbTraceError::StorageUploadFailed(_) => "storage_upload_failed",
            HerbTraceError::NotFound(_) => "not_found",
            HerbTraceError::InvalidInput(_) => "invalid_input",
            HerbTraceError::InvalidConfig(_) => "invalid_config",
        }
    }
}
