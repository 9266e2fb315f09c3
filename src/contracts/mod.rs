mod abi;
mod artifact;
mod caller;
mod codec;
mod deployment;
mod registry;

pub use abi::InterfaceDescription;
pub use artifact::{load_abi, load_bytecode};
pub use caller::{ContractHandle, TxOutcome};
pub use codec::format_value;
pub use deployment::{Deployment, deploy, resolve_signer};
pub use registry::IdentityRegistry;
