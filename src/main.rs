mod app;
mod config;
mod contracts;
mod error;
mod gateway;

use std::path::PathBuf;

use alloy::primitives::Address;
use clap::{Parser, Subcommand};
use color_eyre::Result;

#[derive(Parser, Debug)]
#[command(name = "sidctl")]
#[command(about = "Deploy and interact with the SID identity registry contract")]
#[command(version)]
struct Cli {
    /// Path to a config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Node RPC endpoint, overriding the config file
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Contract address, overriding the config file
    #[arg(long, global = true)]
    contract: Option<Address>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Deploy the compiled contract and print its address
    Deploy {
        /// ABI file (bare array or compiler artifact)
        #[arg(long)]
        abi: Option<PathBuf>,
        /// Hex-encoded creation bytecode
        #[arg(long)]
        bytecode: Option<PathBuf>,
        /// Signer account; defaults to the node's first account
        #[arg(long)]
        from: Option<Address>,
        /// Store the new address in the config file
        #[arg(long)]
        save: bool,
    },
    /// Register an identifier, read it back and verify it
    Interact {
        #[arg(long, default_value = "user123")]
        id: String,
        #[arg(long)]
        from: Option<Address>,
        #[arg(long)]
        abi: Option<PathBuf>,
    },
    /// Register an identifier for the signer
    Register {
        id: String,
        #[arg(long)]
        from: Option<Address>,
        #[arg(long)]
        abi: Option<PathBuf>,
    },
    /// Print the identifier stored for an address
    GetId {
        /// Defaults to the node's first account
        owner: Option<Address>,
        #[arg(long)]
        abi: Option<PathBuf>,
    },
    /// Check whether an address is registered with exactly this identifier
    Verify {
        owner: Address,
        id: String,
        #[arg(long)]
        abi: Option<PathBuf>,
    },
    /// List the accounts the node can sign for
    Accounts,
    /// Print the validated interface description
    Abi {
        #[arg(long)]
        abi: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
            .init();
    }

    app::run(cli).await
}
