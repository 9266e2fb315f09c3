use std::fs;
use std::path::Path;

use alloy::primitives::Bytes;

use super::abi::InterfaceDescription;
use crate::error::{ClientError, Result};

/// Load and validate an interface description file.
/// Accepts a bare ABI array or a compiler artifact with an `abi` field.
pub fn load_abi(path: &Path) -> Result<InterfaceDescription> {
    let content = fs::read_to_string(path)
        .map_err(|e| ClientError::configuration(path, format!("Failed to read ABI: {}", e)))?;

    let abi = InterfaceDescription::parse_str(&content)?;

    tracing::debug!(
        "Loaded ABI from {:?}: {} functions, {} events",
        path,
        abi.functions.len(),
        abi.events.len()
    );
    Ok(abi)
}

/// Load hex-encoded creation bytecode
pub fn load_bytecode(path: &Path) -> Result<Bytes> {
    let content = fs::read_to_string(path)
        .map_err(|e| ClientError::configuration(path, format!("Failed to read bytecode: {}", e)))?;

    decode_bytecode(&content).map_err(|reason| ClientError::configuration(path, reason))
}

fn decode_bytecode(content: &str) -> std::result::Result<Bytes, String> {
    let trimmed = content.trim();
    let hex_str = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if hex_str.is_empty() {
        return Err("bytecode file is empty".to_string());
    }

    let bytes = hex::decode(hex_str).map_err(|e| format!("Invalid hex bytecode: {}", e))?;
    Ok(Bytes::from(bytes))
}
