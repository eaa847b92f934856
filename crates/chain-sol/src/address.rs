//! Solana addresses and transaction signatures.
//!
//! An address is the Base58 encoding of a raw 32-byte Ed25519 public key (or
//! of an off-curve program-derived address). A transaction signature is the
//! Base58 encoding of the fee payer's 64-byte Ed25519 signature, and doubles
//! as the transaction id.

use crate::error::SolError;

/// Encode 32 bytes as a Solana address.
pub fn bytes_to_address(bytes: &[u8; 32]) -> String {
    bs58::encode(bytes).into_string()
}

/// Decode a Solana address to its 32-byte representation.
pub fn address_to_bytes(address: &str) -> Result<[u8; 32], SolError> {
    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|e| SolError::InvalidAddress(format!("base58 decode failed: {e}")))?;

    bytes.try_into().map_err(|v: Vec<u8>| {
        SolError::InvalidAddress(format!("expected 32 bytes, got {}", v.len()))
    })
}

/// Check that `address` decodes to exactly 32 bytes.
pub fn validate_address(address: &str) -> Result<(), SolError> {
    address_to_bytes(address).map(|_| ())
}

/// Encode a 64-byte signature as its Base58 transaction id.
pub fn signature_to_string(signature: &[u8; 64]) -> String {
    bs58::encode(signature).into_string()
}

/// Decode a Base58 transaction signature.
pub fn signature_from_str(signature: &str) -> Result<[u8; 64], SolError> {
    let bytes = bs58::decode(signature)
        .into_vec()
        .map_err(|e| SolError::InvalidSignature(format!("base58 decode failed: {e}")))?;

    bytes.try_into().map_err(|v: Vec<u8>| {
        SolError::InvalidSignature(format!("expected 64 bytes, got {}", v.len()))
    })
}
