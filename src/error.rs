use std::path::PathBuf;

use alloy::primitives::B256;

/// Errors surfaced by the contract client and the gateways behind it
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Configuration error ({}): {reason}", path.display())]
    Configuration { path: PathBuf, reason: String },

    #[error("Invalid interface description: {0}")]
    Schema(String),

    #[error("ABI error: {0}")]
    Abi(String),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Transaction rejected: {reason}{}", tx_hash.map(|h| format!(" (tx {h})")).unwrap_or_default())]
    Transaction {
        reason: String,
        tx_hash: Option<B256>,
    },

    #[error("Gateway returned no accounts; cannot resolve a signer")]
    NoAccounts,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl ClientError {
    pub fn configuration(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    pub fn abi(msg: impl Into<String>) -> Self {
        Self::Abi(msg.into())
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Transaction {
            reason: reason.into(),
            tx_hash: None,
        }
    }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
