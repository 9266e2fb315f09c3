//! In-process gateway double emulating the identity registry contract.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use alloy::dyn_abi::{DynSolType, DynSolValue};
use alloy::primitives::{Address, Bytes, keccak256};
use async_trait::async_trait;

use super::{Gateway, LogEntry, Receipt, TxParams};
use crate::error::{ClientError, Result};

fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

#[derive(Default)]
struct State {
    /// contract address -> (owner -> identifier)
    contracts: HashMap<Address, HashMap<Address, String>>,
    nonces: HashMap<Address, u64>,
    tx_count: u64,
}

pub struct MemoryGateway {
    accounts: Vec<Address>,
    state: Mutex<State>,
    deploy_calls: AtomicUsize,
}

impl MemoryGateway {
    pub fn new(accounts: Vec<Address>) -> Self {
        Self {
            accounts,
            state: Mutex::new(State::default()),
            deploy_calls: AtomicUsize::new(0),
        }
    }

    /// A gateway with an already deployed registry at `contract`
    pub fn with_contract(accounts: Vec<Address>, contract: Address) -> Self {
        let gateway = Self::new(accounts);
        gateway
            .state
            .lock()
            .unwrap()
            .contracts
            .insert(contract, HashMap::new());
        gateway
    }

    /// Number of deploy submissions that reached the gateway
    pub fn deploy_calls(&self) -> usize {
        self.deploy_calls.load(Ordering::SeqCst)
    }

    fn check_sender(&self, from: Address) -> Result<()> {
        if self.accounts.contains(&from) {
            Ok(())
        } else {
            Err(ClientError::rejected(format!("sender account not recognized: {}", from)))
        }
    }

    fn next_receipt(
        state: &mut State,
        contract_address: Option<Address>,
        logs: Vec<LogEntry>,
    ) -> Receipt {
        state.tx_count += 1;
        Receipt {
            tx_hash: keccak256(state.tx_count.to_be_bytes()),
            block_number: Some(state.tx_count),
            gas_used: 21_000,
            contract_address,
            logs,
        }
    }
}

fn decode_args(types: Vec<DynSolType>, input: &[u8]) -> Result<Vec<DynSolValue>> {
    match DynSolType::Tuple(types).abi_decode_params(input) {
        Ok(DynSolValue::Tuple(values)) => Ok(values),
        _ => Err(ClientError::rejected("execution reverted: malformed calldata")),
    }
}

fn split_selector(input: &[u8]) -> Result<([u8; 4], &[u8])> {
    if input.len() < 4 {
        return Err(ClientError::rejected("execution reverted: missing selector"));
    }
    Ok(([input[0], input[1], input[2], input[3]], &input[4..]))
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(self.accounts.clone())
    }

    async fn deploy(&self, code: Bytes, params: TxParams) -> Result<Receipt> {
        self.deploy_calls.fetch_add(1, Ordering::SeqCst);
        self.check_sender(params.from)?;
        if code.is_empty() {
            return Err(ClientError::rejected("contract creation code is empty"));
        }

        let mut state = self.state.lock().unwrap();
        let nonce = state.nonces.entry(params.from).or_default();
        let address = params.from.create(*nonce);
        *nonce += 1;
        state.contracts.insert(address, HashMap::new());

        Ok(Self::next_receipt(&mut state, Some(address), vec![]))
    }

    async fn send(&self, to: Address, input: Bytes, params: TxParams) -> Result<Receipt> {
        self.check_sender(params.from)?;
        let (sel, args) = split_selector(&input)?;
        if sel != selector("register(string)") {
            return Err(ClientError::rejected("execution reverted: unknown function"));
        }
        let values = decode_args(vec![DynSolType::String], args)?;
        let id = values[0].as_str().unwrap_or_default().to_string();

        let mut state = self.state.lock().unwrap();
        let registry = state
            .contracts
            .get_mut(&to)
            .ok_or_else(|| ClientError::rejected(format!("no contract code at {}", to)))?;
        registry.insert(params.from, id.clone());

        let log = LogEntry {
            address: to,
            topics: vec![keccak256("Registered(address,string)"), params.from.into_word()],
            data: DynSolValue::Tuple(vec![DynSolValue::String(id)])
                .abi_encode_params()
                .into(),
        };
        Ok(Self::next_receipt(&mut state, None, vec![log]))
    }

    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes> {
        let state = self.state.lock().unwrap();
        let Some(registry) = state.contracts.get(&to) else {
            // No code at the address: the node answers with empty data
            return Ok(Bytes::new());
        };

        let (sel, args) = split_selector(&input)?;
        let output = if sel == selector("getID(address)") {
            let values = decode_args(vec![DynSolType::Address], args)?;
            let owner = values[0].as_address().unwrap_or_default();
            let id = registry.get(&owner).cloned().unwrap_or_default();
            DynSolValue::String(id)
        } else if sel == selector("verify(address,string)") {
            let values = decode_args(vec![DynSolType::Address, DynSolType::String], args)?;
            let owner = values[0].as_address().unwrap_or_default();
            let candidate = values[1].as_str().unwrap_or_default();
            let stored = registry.get(&owner).map(String::as_str).unwrap_or_default();
            DynSolValue::Bool(stored == candidate)
        } else {
            return Err(ClientError::rejected("execution reverted: unknown function"));
        };

        Ok(DynSolValue::Tuple(vec![output]).abi_encode_params().into())
    }
}

/// Deterministic test accounts
pub fn accounts(n: u8) -> Vec<Address> {
    (1..=n).map(Address::repeat_byte).collect()
}
