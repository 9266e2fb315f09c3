use std::time::Duration;

use alloy::{
    network::{Ethereum, ReceiptResponse, TransactionBuilder},
    primitives::{Address, B256, Bytes},
    providers::{
        DynProvider, PendingTransactionBuilder, PendingTransactionError, Provider, ProviderBuilder,
    },
    rpc::types::{TransactionReceipt, TransactionRequest},
    transports::TransportError,
};
use async_trait::async_trait;

use super::{Gateway, LogEntry, Receipt, TxParams};
use crate::error::{ClientError, Result};

/// Gateway backed by a JSON-RPC node.
///
/// Transactions are sent with `eth_sendTransaction`, so `from` must be an
/// account the node holds unlocked (Ganache, Anvil, Hardhat node).
pub struct RpcGateway {
    endpoint: String,
    provider: DynProvider,
    receipt_timeout: Duration,
}

impl RpcGateway {
    pub async fn connect(endpoint: &str, receipt_timeout: Duration) -> Result<Self> {
        let provider = ProviderBuilder::new()
            .connect(endpoint)
            .await
            .map_err(|e| ClientError::Gateway(format!("Failed to connect to {}: {}", endpoint, e)))?
            .erased();

        tracing::debug!("Connected to {}", endpoint);

        Ok(Self {
            endpoint: endpoint.to_string(),
            provider,
            receipt_timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request(params: &TxParams) -> TransactionRequest {
        let mut tx = TransactionRequest::default().from(params.from);
        if let Some(gas) = params.gas_limit {
            tx = tx.gas_limit(gas);
        }
        if let Some(price) = params.gas_price {
            tx = tx.gas_price(price);
        }
        tx
    }

    async fn submit(&self, tx: TransactionRequest) -> Result<Receipt> {
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(classify)?;

        self.await_receipt(pending).await
    }

    async fn await_receipt(&self, pending: PendingTransactionBuilder<Ethereum>) -> Result<Receipt> {
        let tx_hash = *pending.tx_hash();
        tracing::info!("Submitted transaction {}", tx_hash);

        let receipt = pending
            .with_timeout(Some(self.receipt_timeout))
            .get_receipt()
            .await
            .map_err(|e| no_receipt(tx_hash, e))?;

        check_receipt(&receipt)
    }
}

#[async_trait]
impl Gateway for RpcGateway {
    async fn accounts(&self) -> Result<Vec<Address>> {
        self.provider.get_accounts().await.map_err(classify)
    }

    async fn deploy(&self, code: Bytes, params: TxParams) -> Result<Receipt> {
        let tx = Self::request(&params).with_deploy_code(code);
        self.submit(tx).await
    }

    async fn send(&self, to: Address, input: Bytes, params: TxParams) -> Result<Receipt> {
        let tx = Self::request(&params).to(to).input(input.into());
        self.submit(tx).await
    }

    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes> {
        let tx = TransactionRequest::default().to(to).input(input.into());
        self.provider.call(tx).await.map_err(classify)
    }
}

/// A JSON-RPC error response means the node evaluated and refused the request
/// (revert, out of gas, unknown sender); anything else is a transport failure.
fn classify(err: TransportError) -> ClientError {
    match err.as_error_resp() {
        Some(payload) => ClientError::rejected(payload.message.to_string()),
        None => ClientError::Gateway(err.to_string()),
    }
}

/// Timeouts and failures while waiting are connectivity problems; the
/// transaction may still be mined later.
fn no_receipt(tx_hash: B256, err: PendingTransactionError) -> ClientError {
    ClientError::Gateway(format!("No receipt for transaction {}: {}", tx_hash, err))
}

fn check_receipt(receipt: &TransactionReceipt) -> Result<Receipt> {
    if !receipt.status() {
        return Err(ClientError::Transaction {
            reason: "execution reverted".to_string(),
            tx_hash: Some(receipt.transaction_hash),
        });
    }
    Ok(convert_receipt(receipt))
}

fn convert_receipt(receipt: &TransactionReceipt) -> Receipt {
    let logs = receipt
        .inner
        .logs()
        .iter()
        .map(|log| LogEntry {
            address: log.address(),
            topics: log.topics().to_vec(),
            data: log.data().data.clone(),
        })
        .collect();

    Receipt {
        tx_hash: receipt.transaction_hash,
        block_number: receipt.block_number,
        gas_used: receipt.gas_used,
        contract_address: receipt.contract_address,
        logs,
    }
}
