//! Node RPC gateway seam.
//!
//! The gateway works at the calldata level: encoding and decoding against an
//! interface description happens in [`crate::contracts`], the gateway only moves
//! bytes to and from the node.

mod rpc;

#[cfg(test)]
pub mod memory;

pub use rpc::RpcGateway;

use alloy::primitives::{Address, B256, Bytes};
use async_trait::async_trait;

use crate::error::Result;

/// Sender and gas policy for a state-changing submission.
/// Unset gas fields are left for the node to estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxParams {
    pub from: Address,
    pub gas_limit: Option<u64>,
    pub gas_price: Option<u128>,
}

impl TxParams {
    pub fn sender(from: Address) -> Self {
        Self {
            from,
            gas_limit: None,
            gas_price: None,
        }
    }

    pub fn with_gas(mut self, gas_limit: u64, gas_price: u128) -> Self {
        self.gas_limit = Some(gas_limit);
        self.gas_price = Some(gas_price);
        self
    }
}

/// A log emitted by a mined transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// A successfully mined transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    /// Set for contract creations only
    pub contract_address: Option<Address>,
    pub logs: Vec<LogEntry>,
}

/// The external blockchain node.
///
/// `deploy` and `send` block until the transaction is mined. A mined but failed
/// transaction, or one the node refuses, is a `ClientError::Transaction`;
/// connectivity problems and timeouts are `ClientError::Gateway`.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Accounts the node can sign for, in node order
    async fn accounts(&self) -> Result<Vec<Address>>;

    /// Submit contract creation code
    async fn deploy(&self, code: Bytes, params: TxParams) -> Result<Receipt>;

    /// Submit a state-changing call
    async fn send(&self, to: Address, input: Bytes, params: TxParams) -> Result<Receipt>;

    /// Execute a read-only call; no transaction is created
    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes>;
}
