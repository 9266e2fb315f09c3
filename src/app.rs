use std::path::{Path, PathBuf};

use alloy::primitives::Address;
use eyre::{Result, WrapErr};

use crate::config::AppConfig;
use crate::contracts::{
    self, ContractHandle, IdentityRegistry, InterfaceDescription, TxOutcome, format_value,
};
use crate::gateway::{Gateway, RpcGateway};
use crate::{Cli, Command};

/// Resolve configuration, connect, and run one command
pub async fn run(cli: Cli) -> Result<()> {
    let stored = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    let mut config = stored.clone();
    if let Some(endpoint) = cli.endpoint {
        config.client.endpoint = endpoint;
    }
    if let Some(contract) = cli.contract {
        config.client.contract_address = contract.to_checksum(None);
    }

    match cli.command {
        // The interface can be inspected without a node
        Command::Abi { abi } => {
            let abi = load_abi(&config, abi.as_deref())?;
            print_abi(&abi);
            Ok(())
        }
        Command::Deploy {
            abi,
            bytecode,
            from,
            save,
        } => {
            let gateway = connect(&config).await?;
            // Overrides stay out of the saved file
            let persist = save.then_some(stored);
            deploy(&gateway, &config, abi, bytecode, from, persist).await
        }
        Command::Interact { id, from, abi } => {
            let gateway = connect(&config).await?;
            let abi = load_abi(&config, abi.as_deref())?;
            let registry = registry(&gateway, &config, &abi)?;
            interact(&gateway, &registry, &id, from).await
        }
        Command::Register { id, from, abi } => {
            let gateway = connect(&config).await?;
            let abi = load_abi(&config, abi.as_deref())?;
            let registry = registry(&gateway, &config, &abi)?;
            let signer = contracts::resolve_signer(&gateway, from).await?;
            let outcome = registry
                .register(&id, signer)
                .await
                .wrap_err("Registration failed")?;
            println!("✓ ID registered: {}", id);
            print_outcome(&outcome);
            Ok(())
        }
        Command::GetId { owner, abi } => {
            let gateway = connect(&config).await?;
            let abi = load_abi(&config, abi.as_deref())?;
            let registry = registry(&gateway, &config, &abi)?;
            let owner = contracts::resolve_signer(&gateway, owner).await?;
            let identifier = registry.get_identifier(owner).await?;
            println!("{}", identifier);
            Ok(())
        }
        Command::Verify { owner, id, abi } => {
            let gateway = connect(&config).await?;
            let abi = load_abi(&config, abi.as_deref())?;
            let registry = registry(&gateway, &config, &abi)?;
            let matches = registry.verify(owner, &id).await?;
            println!("{}", matches);
            Ok(())
        }
        Command::Accounts => {
            let gateway = connect(&config).await?;
            for account in gateway.accounts().await? {
                println!("{}", account.to_checksum(None));
            }
            Ok(())
        }
    }
}

async fn connect(config: &AppConfig) -> Result<RpcGateway> {
    let gateway = RpcGateway::connect(&config.client.endpoint, config.client.receipt_timeout())
        .await
        .wrap_err("Failed to open node connection")?;
    tracing::info!("Using node at {}", gateway.endpoint());
    Ok(gateway)
}

fn load_abi(config: &AppConfig, path: Option<&Path>) -> Result<InterfaceDescription> {
    let path = path.unwrap_or(config.artifacts.abi.as_path());
    Ok(contracts::load_abi(path)?)
}

fn registry<'a, G: Gateway + ?Sized>(
    gateway: &'a G,
    config: &AppConfig,
    abi: &'a InterfaceDescription,
) -> Result<IdentityRegistry<'a, G>> {
    let address = config.client.contract_address()?;
    let handle = ContractHandle::new(gateway, address, abi);
    Ok(IdentityRegistry::new(handle)?)
}

/// Deploy the contract. When `persist` is given, the new address is written
/// into that configuration and saved.
async fn deploy<G: Gateway + ?Sized>(
    gateway: &G,
    config: &AppConfig,
    abi_path: Option<PathBuf>,
    bytecode_path: Option<PathBuf>,
    from: Option<Address>,
    persist: Option<AppConfig>,
) -> Result<()> {
    let abi = load_abi(config, abi_path.as_deref())?;
    let bytecode_path = bytecode_path.unwrap_or_else(|| config.artifacts.bytecode.clone());
    let bytecode = contracts::load_bytecode(&bytecode_path)?;

    let deployer = contracts::resolve_signer(gateway, from).await?;
    println!("Deploying contract from account: {}", deployer.to_checksum(None));

    let deployment = contracts::deploy(gateway, &abi, bytecode, Some(deployer), &config.client)
        .await
        .wrap_err("Deployment failed")?;
    tracing::debug!("Deployed by {}", deployment.deployer);

    println!(
        "Contract deployed at address: {}",
        deployment.address.to_checksum(None)
    );
    println!(
        "  tx: {} (gas used {})",
        deployment.receipt.tx_hash, deployment.receipt.gas_used
    );

    if let Some(mut saved) = persist {
        saved.client.contract_address = deployment.address.to_checksum(None);
        let path = saved.save()?;
        println!("  saved to {}", path.display());
    }

    Ok(())
}

/// The register → read back → verify sequence
async fn interact<G: Gateway + ?Sized>(
    gateway: &G,
    registry: &IdentityRegistry<'_, G>,
    id: &str,
    from: Option<Address>,
) -> Result<()> {
    let signer = contracts::resolve_signer(gateway, from).await?;
    tracing::info!("Registry at {}, signer {}", registry.address(), signer);

    let outcome = registry
        .register(id, signer)
        .await
        .wrap_err("Registration failed")?;
    println!("✓ ID registered: {}", id);
    print_outcome(&outcome);

    let stored = registry.get_identifier(signer).await?;
    println!("ID stored in contract: {}", stored);

    let verified = registry.verify(signer, id).await?;
    println!("Verification passed? {}", verified);

    Ok(())
}

fn print_outcome(outcome: &TxOutcome) {
    let receipt = &outcome.receipt;
    println!(
        "  tx: {} (block {}, gas used {})",
        receipt.tx_hash,
        receipt
            .block_number
            .map(|n| n.to_string())
            .unwrap_or_else(|| "pending".to_string()),
        receipt.gas_used
    );
    for event in &outcome.events {
        let fields: Vec<String> = event
            .fields
            .iter()
            .map(|(name, value)| format!("{}={}", name, format_value(value)))
            .collect();
        println!("  event {}({})", event.name, fields.join(", "));
    }
}

fn print_abi(abi: &InterfaceDescription) {
    if let Some(constructor) = &abi.constructor {
        let inputs: Vec<String> = constructor.inputs.iter().map(|p| p.kind.canonical()).collect();
        println!(
            "constructor({}) {}",
            inputs.join(","),
            constructor.mutability.as_str()
        );
    }
    for function in &abi.functions {
        let outputs: Vec<String> = function.outputs.iter().map(|p| p.kind.canonical()).collect();
        println!(
            "0x{}  {} {} -> ({})",
            hex::encode(function.selector()),
            function.signature(),
            function.mutability.as_str(),
            outputs.join(",")
        );
    }
    for event in &abi.events {
        if event.anonymous {
            println!("event {} (anonymous)", event.signature());
        } else {
            println!("event {}  topic {}", event.signature(), event.topic());
        }
    }
    for error in &abi.errors {
        let inputs: Vec<String> = error.inputs.iter().map(|p| p.kind.canonical()).collect();
        println!("error {}({})", error.name, inputs.join(","));
    }
    if abi.has_fallback {
        println!("fallback");
    }
    if abi.has_receive {
        println!("receive");
    }
}
