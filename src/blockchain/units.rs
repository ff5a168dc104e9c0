//! Amount, address and hash parsing/formatting.
//!
//! Amounts travel over MCP as decimal strings ("0.5") and are converted with
//! alloy's unit helpers. Addresses are rendered with the EIP-1191 checksum on
//! Rootstock chains and plain EIP-55 elsewhere.

use alloy::primitives::utils::{format_units, parse_units, ParseUnits};
use alloy::primitives::{Address, TxHash, U256};
use std::str::FromStr;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Decimals of RBTC.
pub const NATIVE_DECIMALS: u8 = 18;

/// Chain ids that use the EIP-1191 checksum.
const EIP1191_CHAINS: [u64; 2] = [30, 31];

/// Parse a non-negative decimal amount into base units.
pub fn parse_amount(amount: &str, decimals: u8) -> BlockchainResult<U256> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(BlockchainError::InvalidInput("amount is empty".to_string()));
    }
    if amount.starts_with('-') {
        return Err(BlockchainError::InvalidInput(format!(
            "amount must not be negative: {}",
            amount
        )));
    }
    if let Some((_, fraction)) = amount.split_once('.') {
        if fraction.len() > decimals as usize {
            return Err(BlockchainError::InvalidInput(format!(
                "amount '{}' has more than {} decimal places",
                amount, decimals
            )));
        }
    }

    match parse_units(amount, decimals) {
        Ok(ParseUnits::U256(value)) => Ok(value),
        Ok(ParseUnits::I256(_)) => Err(BlockchainError::InvalidInput(format!(
            "amount must not be negative: {}",
            amount
        ))),
        Err(e) => Err(BlockchainError::InvalidInput(format!(
            "invalid amount '{}': {}",
            amount, e
        ))),
    }
}

/// Format base units as a decimal string, keeping at least one fractional digit.
pub fn format_amount(value: U256, decimals: u8) -> BlockchainResult<String> {
    let formatted = format_units(value, decimals)
        .map_err(|e| BlockchainError::InvalidInput(format!("cannot format amount: {}", e)))?;
    Ok(trim_fraction(&formatted))
}

/// Format a wei gas price as gwei.
pub fn format_gwei(wei: u128) -> String {
    format_amount(U256::from(wei), 9).unwrap_or_else(|_| wei.to_string())
}

fn trim_fraction(formatted: &str) -> String {
    match formatted.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                format!("{}.0", whole)
            } else {
                format!("{}.{}", whole, fraction)
            }
        }
        None => format!("{}.0", formatted),
    }
}

/// Parse a hex address, accepting any checksum casing.
pub fn parse_address(value: &str) -> BlockchainResult<Address> {
    Address::from_str(value.trim())
        .map_err(|e| BlockchainError::InvalidInput(format!("invalid address '{}': {}", value, e)))
}

/// Parse a 32-byte transaction hash.
pub fn parse_tx_hash(value: &str) -> BlockchainResult<TxHash> {
    TxHash::from_str(value.trim()).map_err(|e| {
        BlockchainError::InvalidInput(format!("invalid transaction hash '{}': {}", value, e))
    })
}

/// Parse an unsigned integer given in decimal or `0x` hex.
pub fn parse_u256(value: &str) -> BlockchainResult<U256> {
    let value = value.trim();
    let parsed = match value.strip_prefix("0x") {
        Some(hex) => U256::from_str_radix(hex, 16),
        None => U256::from_str_radix(value, 10),
    };
    parsed.map_err(|e| BlockchainError::InvalidInput(format!("invalid integer '{}': {}", value, e)))
}

/// Render an address with the checksum convention of `chain_id`.
pub fn checksum(address: &Address, chain_id: u64) -> String {
    if EIP1191_CHAINS.contains(&chain_id) {
        address.to_checksum(Some(chain_id))
    } else {
        address.to_checksum(None)
    }
}
