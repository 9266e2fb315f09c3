use alloy::primitives::{Address, Bytes};

use super::abi::InterfaceDescription;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::gateway::{Gateway, Receipt, TxParams};

/// A contract created by [`deploy`]
#[derive(Debug, Clone)]
pub struct Deployment {
    pub address: Address,
    pub deployer: Address,
    pub receipt: Receipt,
}

/// Use the explicit signer when given, otherwise the first gateway account
pub async fn resolve_signer<G: Gateway + ?Sized>(
    gateway: &G,
    explicit: Option<Address>,
) -> Result<Address> {
    if let Some(signer) = explicit {
        return Ok(signer);
    }

    let accounts = gateway.accounts().await?;
    let signer = accounts.first().copied().ok_or(ClientError::NoAccounts)?;
    tracing::info!("Using first gateway account {} as signer", signer);
    Ok(signer)
}

/// Submit creation bytecode with the configured fixed gas policy and wait for
/// it to be mined. The constructor must take no arguments.
pub async fn deploy<G: Gateway + ?Sized>(
    gateway: &G,
    abi: &InterfaceDescription,
    bytecode: Bytes,
    signer: Option<Address>,
    config: &ClientConfig,
) -> Result<Deployment> {
    let arity = abi.constructor_arity();
    if arity > 0 {
        return Err(ClientError::abi(format!(
            "constructor expects {} argument(s); only argument-less constructors are supported",
            arity
        )));
    }

    let deployer = resolve_signer(gateway, signer).await?;
    let params = TxParams::sender(deployer).with_gas(config.gas_limit, u128::from(config.gas_price));

    tracing::info!(
        "Deploying {} bytes from {} (gas limit {}, gas price {})",
        bytecode.len(),
        deployer,
        config.gas_limit,
        config.gas_price
    );

    let receipt = gateway.deploy(bytecode, params).await?;
    let address = receipt.contract_address.ok_or_else(|| {
        ClientError::Gateway(format!(
            "receipt for {} carries no contract address",
            receipt.tx_hash
        ))
    })?;

    Ok(Deployment {
        address,
        deployer,
        receipt,
    })
}
