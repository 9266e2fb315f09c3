use alloy::dyn_abi::DynSolValue;
use alloy::primitives::Address;

use super::caller::{ContractHandle, TxOutcome};
use crate::error::{ClientError, Result};
use crate::gateway::{Gateway, TxParams};

const REGISTER: &str = "register";
const GET_ID: &str = "getID";
const VERIFY: &str = "verify";

/// Client for the identity registry contract: one identifier per address
pub struct IdentityRegistry<'a, G: ?Sized> {
    handle: ContractHandle<'a, G>,
}

impl<'a, G: Gateway + ?Sized> IdentityRegistry<'a, G> {
    /// Wrap a handle whose interface description exposes the registry methods
    pub fn new(handle: ContractHandle<'a, G>) -> Result<Self> {
        handle.require_function(REGISTER, &["string"], &[], false)?;
        handle.require_function(GET_ID, &["address"], &["string"], true)?;
        handle.require_function(VERIFY, &["address", "string"], &["bool"], true)?;
        Ok(Self { handle })
    }

    pub fn address(&self) -> Address {
        self.handle.address()
    }

    /// Register `identifier` for `signer`. Uniqueness is the contract's business.
    pub async fn register(&self, identifier: &str, signer: Address) -> Result<TxOutcome> {
        if identifier.is_empty() {
            return Err(ClientError::InvalidArgument(
                "identifier must not be empty".to_string(),
            ));
        }

        self.handle
            .transact(
                REGISTER,
                &[DynSolValue::String(identifier.to_string())],
                TxParams::sender(signer),
            )
            .await
    }

    /// Identifier stored for `owner`; empty when nothing was registered
    pub async fn get_identifier(&self, owner: Address) -> Result<String> {
        let values = self
            .handle
            .query(GET_ID, &[DynSolValue::Address(owner)])
            .await?;

        match values.first() {
            Some(DynSolValue::String(id)) => Ok(id.clone()),
            other => Err(ClientError::abi(format!(
                "getID returned {:?}, expected a string",
                other
            ))),
        }
    }

    /// Exact, case-sensitive comparison performed by the contract
    pub async fn verify(&self, owner: Address, identifier: &str) -> Result<bool> {
        let values = self
            .handle
            .query(
                VERIFY,
                &[
                    DynSolValue::Address(owner),
                    DynSolValue::String(identifier.to_string()),
                ],
            )
            .await?;

        values
            .first()
            .and_then(DynSolValue::as_bool)
            .ok_or_else(|| ClientError::abi("verify did not return a bool"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::abi::{InterfaceDescription, SID_ABI};
    use crate::gateway::memory::{self, MemoryGateway};

    const CONTRACT: Address = Address::repeat_byte(0xcc);

    fn setup() -> (InterfaceDescription, MemoryGateway) {
        let abi = InterfaceDescription::parse_str(SID_ABI).unwrap();
        let gateway = MemoryGateway::with_contract(memory::accounts(3), CONTRACT);
        (abi, gateway)
    }

    #[tokio::test]
    async fn test_register_get_verify_flow() {
        let (abi, gateway) = setup();
        let registry = IdentityRegistry::new(ContractHandle::new(&gateway, CONTRACT, &abi)).unwrap();
        let me = memory::accounts(3)[0];

        let outcome = registry.register("user123", me).await.unwrap();
        assert!(outcome.receipt.block_number.is_some());
        assert_eq!(
            outcome.events[0].field("id"),
            Some(&DynSolValue::String("user123".to_string()))
        );

        assert_eq!(registry.get_identifier(me).await.unwrap(), "user123");
        assert!(registry.verify(me, "user123").await.unwrap());
        assert!(!registry.verify(me, "wrongId").await.unwrap());
    }

    #[tokio::test]
    async fn test_unregistered_owner_reads_empty() {
        let (abi, gateway) = setup();
        let registry = IdentityRegistry::new(ContractHandle::new(&gateway, CONTRACT, &abi)).unwrap();

        let stranger = memory::accounts(3)[2];
        assert_eq!(registry.get_identifier(stranger).await.unwrap(), "");
        assert!(!registry.verify(stranger, "user123").await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_is_exact_and_tracks_latest() {
        let (abi, gateway) = setup();
        let registry = IdentityRegistry::new(ContractHandle::new(&gateway, CONTRACT, &abi)).unwrap();
        let accounts = memory::accounts(3);
        let (alice, bob) = (accounts[0], accounts[1]);

        registry.register("Alice-01", alice).await.unwrap();
        registry.register("bob", bob).await.unwrap();

        assert!(registry.verify(alice, "Alice-01").await.unwrap());
        for candidate in ["alice-01", "ALICE-01", "Alice-0", "Alice-01 ", "", "bob"] {
            assert!(
                !registry.verify(alice, candidate).await.unwrap(),
                "{:?} should not verify",
                candidate
            );
        }

        // Re-registration replaces the previous identifier
        registry.register("Alice-02", alice).await.unwrap();
        assert_eq!(registry.get_identifier(alice).await.unwrap(), "Alice-02");
        assert!(!registry.verify(alice, "Alice-01").await.unwrap());
        assert!(registry.verify(alice, "Alice-02").await.unwrap());

        // Other owners are unaffected
        assert_eq!(registry.get_identifier(bob).await.unwrap(), "bob");
    }

    #[tokio::test]
    async fn test_register_round_trip_many() {
        let (abi, gateway) = setup();
        let registry = IdentityRegistry::new(ContractHandle::new(&gateway, CONTRACT, &abi)).unwrap();
        let owner = memory::accounts(3)[1];

        let long = "x".repeat(100);
        for id in ["a", "user with spaces", "ünïcødé-🔑", long.as_str()] {
            registry.register(id, owner).await.unwrap();
            assert_eq!(registry.get_identifier(owner).await.unwrap(), id);
            assert!(registry.verify(owner, id).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_empty_identifier_rejected_before_submission() {
        let (abi, gateway) = setup();
        let registry = IdentityRegistry::new(ContractHandle::new(&gateway, CONTRACT, &abi)).unwrap();
        let me = memory::accounts(3)[0];

        let err = registry.register("", me).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));
        assert_eq!(registry.get_identifier(me).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_unknown_signer_is_transaction_error() {
        let (abi, gateway) = setup();
        let registry = IdentityRegistry::new(ContractHandle::new(&gateway, CONTRACT, &abi)).unwrap();

        let err = registry
            .register("user123", Address::repeat_byte(0xee))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Transaction { .. }));
    }

    #[test]
    fn test_rejects_foreign_interface() {
        let abi = InterfaceDescription::parse_str(
            r#"[{"type": "function", "name": "register", "inputs": [{"name": "n", "type": "uint256"}]}]"#,
        )
        .unwrap();
        let gateway = MemoryGateway::new(vec![]);
        let result = IdentityRegistry::new(ContractHandle::new(&gateway, CONTRACT, &abi));
        assert!(matches!(result, Err(ClientError::Schema(_))));
    }
}
