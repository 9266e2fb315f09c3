use alloy::dyn_abi::DynSolType;
use alloy::primitives::{B256, keccak256};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ClientError, Result};

/// Solidity parameter kind, validated at load time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    Address,
    Bool,
    String,
    Bytes,
    FixedBytes(usize),
    Uint(usize),
    Int(usize),
    Array(Box<ParamKind>),
    FixedArray(Box<ParamKind>, usize),
    Tuple(Vec<ParamKind>),
}

impl ParamKind {
    /// Canonical type string, as used in signatures
    pub fn canonical(&self) -> String {
        match self {
            ParamKind::Address => "address".to_string(),
            ParamKind::Bool => "bool".to_string(),
            ParamKind::String => "string".to_string(),
            ParamKind::Bytes => "bytes".to_string(),
            ParamKind::FixedBytes(n) => format!("bytes{}", n),
            ParamKind::Uint(bits) => format!("uint{}", bits),
            ParamKind::Int(bits) => format!("int{}", bits),
            ParamKind::Array(inner) => format!("{}[]", inner.canonical()),
            ParamKind::FixedArray(inner, len) => format!("{}[{}]", inner.canonical(), len),
            ParamKind::Tuple(members) => {
                let inner: Vec<String> = members.iter().map(ParamKind::canonical).collect();
                format!("({})", inner.join(","))
            }
        }
    }

    /// Indexed event fields of reference types are stored as their keccak hash
    pub fn is_hashed_in_topic(&self) -> bool {
        matches!(
            self,
            ParamKind::String
                | ParamKind::Bytes
                | ParamKind::Array(_)
                | ParamKind::FixedArray(..)
                | ParamKind::Tuple(_)
        )
    }

    pub fn to_sol_type(&self) -> DynSolType {
        match self {
            ParamKind::Address => DynSolType::Address,
            ParamKind::Bool => DynSolType::Bool,
            ParamKind::String => DynSolType::String,
            ParamKind::Bytes => DynSolType::Bytes,
            ParamKind::FixedBytes(n) => DynSolType::FixedBytes(*n),
            ParamKind::Uint(bits) => DynSolType::Uint(*bits),
            ParamKind::Int(bits) => DynSolType::Int(*bits),
            ParamKind::Array(inner) => DynSolType::Array(Box::new(inner.to_sol_type())),
            ParamKind::FixedArray(inner, len) => {
                DynSolType::FixedArray(Box::new(inner.to_sol_type()), *len)
            }
            ParamKind::Tuple(members) => {
                DynSolType::Tuple(members.iter().map(ParamKind::to_sol_type).collect())
            }
        }
    }

    fn parse(ty: &str, components: Option<&[RawParam]>) -> Result<Self> {
        // Array suffixes bind from the right: uint256[2][] is a dynamic array of uint256[2]
        if let Some(stripped) = ty.strip_suffix(']') {
            let open = stripped
                .rfind('[')
                .ok_or_else(|| ClientError::schema(format!("unbalanced brackets in type '{}'", ty)))?;
            let inner = Self::parse(&stripped[..open], components)?;
            let dim = &stripped[open + 1..];
            if dim.is_empty() {
                return Ok(ParamKind::Array(Box::new(inner)));
            }
            let len = decimal(dim)
                .ok_or_else(|| ClientError::schema(format!("invalid array length in type '{}'", ty)))?;
            if len == 0 {
                return Err(ClientError::schema(format!("zero-length array type '{}'", ty)));
            }
            return Ok(ParamKind::FixedArray(Box::new(inner), len));
        }

        match ty {
            "address" => Ok(ParamKind::Address),
            "bool" => Ok(ParamKind::Bool),
            "string" => Ok(ParamKind::String),
            "bytes" => Ok(ParamKind::Bytes),
            "uint" => Ok(ParamKind::Uint(256)),
            "int" => Ok(ParamKind::Int(256)),
            "tuple" => {
                let components = components
                    .filter(|c| !c.is_empty())
                    .ok_or_else(|| ClientError::schema("tuple parameter without components"))?;
                let members = components
                    .iter()
                    .map(|c| Self::parse(&c.param_type, c.components.as_deref()))
                    .collect::<Result<Vec<_>>>()?;
                Ok(ParamKind::Tuple(members))
            }
            t if t.starts_with("bytes") => {
                let n = parse_width(&t["bytes".len()..], t)?;
                if !(1..=32).contains(&n) {
                    return Err(ClientError::schema(format!("invalid fixed bytes width in '{}'", t)));
                }
                Ok(ParamKind::FixedBytes(n))
            }
            t if t.starts_with("uint") => Ok(ParamKind::Uint(int_bits(&t["uint".len()..], t)?)),
            t if t.starts_with("int") => Ok(ParamKind::Int(int_bits(&t["int".len()..], t)?)),
            _ => Err(ClientError::schema(format!("unsupported parameter type '{}'", ty))),
        }
    }
}

/// Plain decimal: ASCII digits only, no sign, no leading zeros
fn decimal(digits: &str) -> Option<usize> {
    let plain = !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (digits.len() == 1 || !digits.starts_with('0'));
    if plain { digits.parse().ok() } else { None }
}

fn parse_width(digits: &str, ty: &str) -> Result<usize> {
    decimal(digits).ok_or_else(|| ClientError::schema(format!("unsupported parameter type '{}'", ty)))
}

fn int_bits(digits: &str, ty: &str) -> Result<usize> {
    let bits = parse_width(digits, ty)?;
    if bits == 0 || bits > 256 || bits % 8 != 0 {
        return Err(ClientError::schema(format!("invalid integer width in '{}'", ty)));
    }
    Ok(bits)
}

/// Function or event parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    /// Only meaningful for event parameters
    pub indexed: bool,
}

/// Read-only vs state-changing classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    Pure,
    View,
    NonPayable,
    Payable,
}

impl Mutability {
    pub fn is_read_only(self) -> bool {
        matches!(self, Mutability::Pure | Mutability::View)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mutability::Pure => "pure",
            Mutability::View => "view",
            Mutability::NonPayable => "nonpayable",
            Mutability::Payable => "payable",
        }
    }

    fn from_raw(raw: &RawEntry) -> Result<Self> {
        match raw.state_mutability.as_deref() {
            Some("pure") => Ok(Mutability::Pure),
            Some("view") => Ok(Mutability::View),
            Some("nonpayable") => Ok(Mutability::NonPayable),
            Some("payable") => Ok(Mutability::Payable),
            Some(other) => Err(ClientError::schema(format!(
                "unknown stateMutability '{}'",
                other
            ))),
            // Pre-0.4.16 compilers emitted constant/payable flags instead
            None if raw.constant => Ok(Mutability::View),
            None if raw.payable => Ok(Mutability::Payable),
            None => Ok(Mutability::NonPayable),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub inputs: Vec<Param>,
    pub outputs: Vec<Param>,
    pub mutability: Mutability,
}

impl Function {
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, join_kinds(&self.inputs))
    }

    pub fn selector(&self) -> [u8; 4] {
        let hash = keccak256(self.signature().as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    pub fn is_read_only(&self) -> bool {
        self.mutability.is_read_only()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub name: String,
    pub inputs: Vec<Param>,
    pub anonymous: bool,
}

impl Event {
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, join_kinds(&self.inputs))
    }

    /// Topic 0 of every non-anonymous emission
    pub fn topic(&self) -> B256 {
        keccak256(self.signature().as_bytes())
    }
}

/// Custom error declared by the contract (`"type": "error"`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDecl {
    pub name: String,
    pub inputs: Vec<Param>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constructor {
    pub inputs: Vec<Param>,
    pub mutability: Mutability,
}

fn join_kinds(params: &[Param]) -> String {
    params
        .iter()
        .map(|p| p.kind.canonical())
        .collect::<Vec<_>>()
        .join(",")
}

/// A validated contract interface description
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceDescription {
    pub functions: Vec<Function>,
    pub events: Vec<Event>,
    pub errors: Vec<ErrorDecl>,
    pub constructor: Option<Constructor>,
    pub has_fallback: bool,
    pub has_receive: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    // Entries without a type are functions
    #[serde(rename = "type", default = "default_entry_type")]
    entry_type: String,
    name: Option<String>,
    #[serde(default)]
    inputs: Vec<RawParam>,
    #[serde(default)]
    outputs: Vec<RawParam>,
    state_mutability: Option<String>,
    #[serde(default)]
    constant: bool,
    #[serde(default)]
    payable: bool,
    #[serde(default)]
    anonymous: bool,
}

fn default_entry_type() -> String {
    "function".to_string()
}

#[derive(Debug, Deserialize)]
struct RawParam {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    param_type: String,
    components: Option<Vec<RawParam>>,
    #[serde(default)]
    indexed: bool,
}

impl InterfaceDescription {
    /// Validate an ABI JSON value. Accepts a bare ABI array or a build
    /// artifact carrying the ABI under `abi`.
    pub fn from_json(value: &Value) -> Result<Self> {
        let abi = value.get("abi").unwrap_or(value);
        if !abi.is_array() {
            return Err(ClientError::schema("ABI must be a JSON array"));
        }

        let entries: Vec<RawEntry> = serde_json::from_value(abi.clone())
            .map_err(|e| ClientError::schema(format!("malformed ABI entry: {}", e)))?;

        let mut desc = InterfaceDescription::default();
        for (index, entry) in entries.iter().enumerate() {
            desc.push_entry(entry)
                .map_err(|e| match e {
                    ClientError::Schema(msg) => {
                        ClientError::schema(format!("entry {}: {}", index, msg))
                    }
                    other => other,
                })?;
        }

        Ok(desc)
    }

    pub fn parse_str(abi_str: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(abi_str)
            .map_err(|e| ClientError::schema(format!("ABI is not valid JSON: {}", e)))?;
        Self::from_json(&value)
    }

    fn push_entry(&mut self, raw: &RawEntry) -> Result<()> {
        match raw.entry_type.as_str() {
            "function" => {
                let function = Function {
                    name: required_name(raw)?,
                    inputs: parse_params(&raw.inputs, false)?,
                    outputs: parse_params(&raw.outputs, false)?,
                    mutability: Mutability::from_raw(raw)?,
                };
                self.functions.push(function);
            }
            "event" => {
                let event = Event {
                    name: required_name(raw)?,
                    inputs: parse_params(&raw.inputs, true)?,
                    anonymous: raw.anonymous,
                };
                self.events.push(event);
            }
            "error" => {
                let decl = ErrorDecl {
                    name: required_name(raw)?,
                    inputs: parse_params(&raw.inputs, false)?,
                };
                self.errors.push(decl);
            }
            "constructor" => {
                if self.constructor.is_some() {
                    return Err(ClientError::schema("more than one constructor"));
                }
                self.constructor = Some(Constructor {
                    inputs: parse_params(&raw.inputs, false)?,
                    mutability: Mutability::from_raw(raw)?,
                });
            }
            "fallback" => self.has_fallback = true,
            "receive" => self.has_receive = true,
            other => {
                return Err(ClientError::schema(format!("unknown entry type '{}'", other)));
            }
        }
        Ok(())
    }

    /// Look up a function by exact name; overloaded names are rejected
    pub fn function(&self, name: &str) -> Result<&Function> {
        let mut matches = self.functions.iter().filter(|f| f.name == name);
        let first = matches
            .next()
            .ok_or_else(|| ClientError::abi(format!("no function named '{}'", name)))?;
        if matches.next().is_some() {
            return Err(ClientError::abi(format!(
                "function '{}' is overloaded; overloads are not supported",
                name
            )));
        }
        Ok(first)
    }

    pub fn event_by_topic(&self, topic: &B256) -> Option<&Event> {
        self.events
            .iter()
            .find(|e| !e.anonymous && e.topic() == *topic)
    }

    /// Number of constructor arguments expected at deployment
    pub fn constructor_arity(&self) -> usize {
        self.constructor.as_ref().map_or(0, |c| c.inputs.len())
    }
}

fn required_name(raw: &RawEntry) -> Result<String> {
    match raw.name.as_deref() {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(ClientError::schema(format!(
            "{} entry without a name",
            raw.entry_type
        ))),
    }
}

fn parse_params(params: &[RawParam], allow_indexed: bool) -> Result<Vec<Param>> {
    params
        .iter()
        .map(|p| {
            let kind = ParamKind::parse(&p.param_type, p.components.as_deref())?;
            Ok(Param {
                name: p.name.clone(),
                kind,
                indexed: allow_indexed && p.indexed,
            })
        })
        .collect()
}

#[cfg(test)]
pub(crate) const SID_ABI: &str = r#"[
    {
        "anonymous": false,
        "inputs": [
            {"indexed": true, "internalType": "address", "name": "user", "type": "address"},
            {"indexed": false, "internalType": "string", "name": "id", "type": "string"}
        ],
        "name": "Registered",
        "type": "event"
    },
    {
        "inputs": [{"internalType": "address", "name": "_user", "type": "address"}],
        "name": "getID",
        "outputs": [{"internalType": "string", "name": "", "type": "string"}],
        "stateMutability": "view",
        "type": "function"
    },
    {
        "inputs": [{"internalType": "string", "name": "_id", "type": "string"}],
        "name": "register",
        "outputs": [],
        "stateMutability": "nonpayable",
        "type": "function"
    },
    {
        "inputs": [
            {"internalType": "address", "name": "_user", "type": "address"},
            {"internalType": "string", "name": "_id", "type": "string"}
        ],
        "name": "verify",
        "outputs": [{"internalType": "bool", "name": "", "type": "bool"}],
        "stateMutability": "view",
        "type": "function"
    }
]"#;
