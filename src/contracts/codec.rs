use alloy::dyn_abi::{DynSolType, DynSolValue};

use super::abi::{Event, Function, InterfaceDescription, Param};
use crate::error::{ClientError, Result};
use crate::gateway::LogEntry;

/// An event decoded from a receipt log
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEvent {
    pub name: String,
    pub fields: Vec<(String, DynSolValue)>,
}

impl DecodedEvent {
    pub fn field(&self, name: &str) -> Option<&DynSolValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

fn params_type(params: &[Param]) -> DynSolType {
    DynSolType::Tuple(params.iter().map(|p| p.kind.to_sol_type()).collect())
}

/// Selector followed by the ABI-encoded arguments
pub fn encode_call(function: &Function, args: &[DynSolValue]) -> Result<Vec<u8>> {
    if args.len() != function.inputs.len() {
        return Err(ClientError::abi(format!(
            "{} expects {} argument(s), got {}",
            function.signature(),
            function.inputs.len(),
            args.len()
        )));
    }

    for (i, (param, arg)) in function.inputs.iter().zip(args).enumerate() {
        if !arg.matches(&param.kind.to_sol_type()) {
            return Err(ClientError::abi(format!(
                "argument {} ('{}') of {} must be {}",
                i,
                param.name,
                function.name,
                param.kind.canonical()
            )));
        }
    }

    let mut calldata = function.selector().to_vec();
    calldata.extend(DynSolValue::Tuple(args.to_vec()).abi_encode_params());

    tracing::debug!(
        "Encoded {} as {} bytes (selector 0x{})",
        function.signature(),
        calldata.len(),
        hex::encode(function.selector())
    );

    Ok(calldata)
}

/// Decode return data according to the function outputs
pub fn decode_output(function: &Function, data: &[u8]) -> Result<Vec<DynSolValue>> {
    if function.outputs.is_empty() {
        return Ok(vec![]);
    }
    if data.is_empty() {
        // Calls to an address without code succeed with empty return data
        return Err(ClientError::abi(format!(
            "{} returned no data; is a contract deployed at this address?",
            function.signature()
        )));
    }

    let decoded = params_type(&function.outputs)
        .abi_decode_params(data)
        .map_err(|e| ClientError::abi(format!("Failed to decode {} result: {}", function.name, e)))?;

    match decoded {
        DynSolValue::Tuple(values) => Ok(values),
        other => Ok(vec![other]),
    }
}

/// Decode a receipt log against the events of an interface description.
/// Returns `None` for logs that belong to no known event.
pub fn decode_log(abi: &InterfaceDescription, log: &LogEntry) -> Option<DecodedEvent> {
    let topic0 = log.topics.first()?;
    let event = abi.event_by_topic(topic0)?;

    match decode_event(event, log) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            tracing::warn!("Skipping undecodable {} log: {}", event.name, e);
            None
        }
    }
}

fn decode_event(event: &Event, log: &LogEntry) -> Result<DecodedEvent> {
    let indexed: Vec<&Param> = event.inputs.iter().filter(|p| p.indexed).collect();
    let body: Vec<Param> = event.inputs.iter().filter(|p| !p.indexed).cloned().collect();

    let topics = &log.topics[1..];
    if topics.len() != indexed.len() {
        return Err(ClientError::abi(format!(
            "expected {} indexed topic(s), found {}",
            indexed.len(),
            topics.len()
        )));
    }

    let mut indexed_values = Vec::with_capacity(indexed.len());
    for (param, topic) in indexed.iter().zip(topics) {
        let value = if param.kind.is_hashed_in_topic() {
            DynSolValue::FixedBytes(*topic, 32)
        } else {
            param
                .kind
                .to_sol_type()
                .abi_decode(topic.as_slice())
                .map_err(|e| ClientError::abi(format!("topic '{}': {}", param.name, e)))?
        };
        indexed_values.push(value);
    }

    let mut body_values = if body.is_empty() {
        Vec::new()
    } else {
        match params_type(&body)
            .abi_decode_params(&log.data)
            .map_err(|e| ClientError::abi(format!("log data: {}", e)))?
        {
            DynSolValue::Tuple(values) => values,
            other => vec![other],
        }
    }
    .into_iter();

    let mut indexed_values = indexed_values.into_iter();
    let fields = event
        .inputs
        .iter()
        .map(|p| {
            let value = if p.indexed {
                indexed_values.next()
            } else {
                body_values.next()
            };
            value
                .map(|v| (p.name.clone(), v))
                .ok_or_else(|| ClientError::abi(format!("no value for field '{}'", p.name)))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DecodedEvent {
        name: event.name.clone(),
        fields,
    })
}

/// Human-readable rendering of a decoded value
pub fn format_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Address(addr) => addr.to_checksum(None),
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::String(s) => s.clone(),
        DynSolValue::Bytes(bytes) => format!("0x{}", hex::encode(bytes)),
        DynSolValue::FixedBytes(word, size) => format!("0x{}", hex::encode(&word[..*size])),
        DynSolValue::Uint(num, _) => num.to_string(),
        DynSolValue::Int(num, _) => num.to_string(),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) => {
            let inner: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", inner.join(", "))
        }
        DynSolValue::Tuple(items) => {
            let inner: Vec<String> = items.iter().map(format_value).collect();
            format!("({})", inner.join(", "))
        }
        other => format!("{:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::abi::SID_ABI;
    use alloy::primitives::{Address, B256, U256, address, keccak256};

    fn sid() -> InterfaceDescription {
        InterfaceDescription::parse_str(SID_ABI).unwrap()
    }

    #[test]
    fn test_encode_register_call() {
        let abi = sid();
        let register = abi.function("register").unwrap();
        let calldata =
            encode_call(register, &[DynSolValue::String("user123".to_string())]).unwrap();

        assert_eq!(&calldata[..4], &register.selector());
        // offset word, length word, one padded data word
        assert_eq!(calldata.len(), 4 + 32 * 3);
        assert_eq!(U256::from_be_slice(&calldata[4..36]), U256::from(32));
        assert_eq!(U256::from_be_slice(&calldata[36..68]), U256::from(7));
        assert_eq!(&calldata[68..75], b"user123");
    }

    #[test]
    fn test_encode_rejects_bad_arguments() {
        let abi = sid();
        let verify = abi.function("verify").unwrap();

        let err = encode_call(verify, &[DynSolValue::Address(Address::ZERO)]).unwrap_err();
        assert!(err.to_string().contains("expects 2 argument(s), got 1"));

        let err = encode_call(
            verify,
            &[
                DynSolValue::String("0xabc".to_string()),
                DynSolValue::String("id".to_string()),
            ],
        )
        .unwrap_err();
        assert!(err.to_string().contains("argument 0 ('_user') of verify must be address"));
    }

    #[test]
    fn test_decode_output() {
        let abi = sid();
        let get_id = abi.function("getID").unwrap();
        let data = DynSolValue::Tuple(vec![DynSolValue::String("user123".to_string())])
            .abi_encode_params();

        let values = decode_output(get_id, &data).unwrap();
        assert_eq!(values, vec![DynSolValue::String("user123".to_string())]);

        let err = decode_output(get_id, &[]).unwrap_err();
        assert!(err.to_string().contains("returned no data"));

        let register = abi.function("register").unwrap();
        assert!(decode_output(register, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_decode_registered_log() {
        let abi = sid();
        let user = address!("0x90F8bf6A479f320ead074411a4B0e7944Ea8c9C1");
        let log = LogEntry {
            address: Address::repeat_byte(0x11),
            topics: vec![
                keccak256("Registered(address,string)"),
                user.into_word(),
            ],
            data: DynSolValue::Tuple(vec![DynSolValue::String("user123".to_string())])
                .abi_encode_params()
                .into(),
        };

        let event = decode_log(&abi, &log).unwrap();
        assert_eq!(event.name, "Registered");
        assert_eq!(event.field("user"), Some(&DynSolValue::Address(user)));
        assert_eq!(
            event.field("id"),
            Some(&DynSolValue::String("user123".to_string()))
        );
    }

    #[test]
    fn test_decode_log_ignores_unknown_and_malformed() {
        let abi = sid();
        let unknown = LogEntry {
            address: Address::ZERO,
            topics: vec![B256::repeat_byte(0x42)],
            data: Default::default(),
        };
        assert!(decode_log(&abi, &unknown).is_none());

        let missing_topic = LogEntry {
            address: Address::ZERO,
            topics: vec![keccak256("Registered(address,string)")],
            data: Default::default(),
        };
        assert!(decode_log(&abi, &missing_topic).is_none());
    }

    #[test]
    fn test_format_value() {
        let user = address!("0x90F8bf6A479f320ead074411a4B0e7944Ea8c9C1");
        assert_eq!(
            format_value(&DynSolValue::Address(user)),
            "0x90F8bf6A479f320ead074411a4B0e7944Ea8c9C1"
        );
        assert_eq!(format_value(&DynSolValue::Bool(true)), "true");
        assert_eq!(format_value(&DynSolValue::Uint(U256::from(42), 256)), "42");
        assert_eq!(
            format_value(&DynSolValue::Array(vec![
                DynSolValue::Bytes(vec![0xde, 0xad]),
                DynSolValue::Bytes(vec![]),
            ])),
            "[0xdead, 0x]"
        );
    }
}
