use alloy::dyn_abi::DynSolValue;
use alloy::primitives::Address;

use super::abi::{Function, InterfaceDescription, Param};
use super::codec::{self, DecodedEvent};
use crate::error::{ClientError, Result};
use crate::gateway::{Gateway, Receipt, TxParams};

/// A deployed contract bound to a gateway connection
pub struct ContractHandle<'a, G: ?Sized> {
    address: Address,
    abi: &'a InterfaceDescription,
    gateway: &'a G,
}

/// Result of a mined state-changing call
#[derive(Debug, Clone)]
pub struct TxOutcome {
    pub receipt: Receipt,
    /// Events from this contract's logs that match the interface description
    pub events: Vec<DecodedEvent>,
}

impl<'a, G: Gateway + ?Sized> ContractHandle<'a, G> {
    pub fn new(gateway: &'a G, address: Address, abi: &'a InterfaceDescription) -> Self {
        Self {
            address,
            abi,
            gateway,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Execute a read-only call (view/pure function)
    pub async fn query(&self, method: &str, args: &[DynSolValue]) -> Result<Vec<DynSolValue>> {
        let function = self.abi.function(method)?;
        if !function.is_read_only() {
            return Err(ClientError::abi(format!(
                "{} is {}; submit it as a transaction",
                function.signature(),
                function.mutability.as_str()
            )));
        }

        let calldata = codec::encode_call(function, args)?;
        let output = self.gateway.call(self.address, calldata.into()).await?;

        codec::decode_output(function, &output)
    }

    /// Submit a state-changing call and wait for it to be mined
    pub async fn transact(
        &self,
        method: &str,
        args: &[DynSolValue],
        params: TxParams,
    ) -> Result<TxOutcome> {
        let function = self.abi.function(method)?;
        if function.is_read_only() {
            return Err(ClientError::abi(format!(
                "{} is {}; use a query instead",
                function.signature(),
                function.mutability.as_str()
            )));
        }

        let calldata = codec::encode_call(function, args)?;

        tracing::info!(
            "Sending {} to {} from {}",
            function.signature(),
            self.address,
            params.from
        );

        let receipt = self
            .gateway
            .send(self.address, calldata.into(), params)
            .await?;

        let events = self.decode_events(&receipt);
        Ok(TxOutcome { receipt, events })
    }

    fn decode_events(&self, receipt: &Receipt) -> Vec<DecodedEvent> {
        receipt
            .logs
            .iter()
            .filter(|log| log.address == self.address)
            .filter_map(|log| codec::decode_log(self.abi, log))
            .collect()
    }

    /// Look up a function and check it has the expected shape
    pub fn require_function(
        &self,
        name: &str,
        inputs: &[&str],
        outputs: &[&str],
        read_only: bool,
    ) -> Result<&'a Function> {
        let function = self.abi.function(name).map_err(|e| match e {
            ClientError::Abi(msg) => ClientError::Schema(msg),
            other => other,
        })?;

        let kinds = |params: &[Param]| -> Vec<String> {
            params.iter().map(|p| p.kind.canonical()).collect()
        };
        if kinds(&function.inputs) != inputs
            || kinds(&function.outputs) != outputs
            || function.is_read_only() != read_only
        {
            return Err(ClientError::schema(format!(
                "{} does not match the expected interface",
                function.signature()
            )));
        }
        Ok(function)
    }
}
