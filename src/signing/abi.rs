//! Contract-ABI encoding and hashing of the signed payload.

use std::str::FromStr as _;

use alloy::primitives::keccak256;
use alloy::sol_types::SolValue as _;

use crate::Result;
use crate::error::Error;
use crate::types::{Address, B256, U256};

/// Parses a 20-byte hex address, with or without `0x`.
///
/// Any other length is rejected rather than padded or truncated.
pub fn parse_address(value: &str) -> Result<Address> {
    Address::from_str(value.trim())
        .map_err(|e| Error::encoding(format!("invalid address `{value}`: {e}")))
}

/// `abi.encode(string payload, address user, address signer, uint256 nonce)`.
#[must_use]
pub fn encode_payload(payload: &str, user: Address, signer: Address, nonce: u64) -> Vec<u8> {
    (payload.to_owned(), user, signer, U256::from(nonce)).abi_encode_params()
}

/// Keccak-256 of the encoded payload; this is the message that gets signed.
#[must_use]
pub fn content_hash(encoded: &[u8]) -> B256 {
    keccak256(encoded)
}
