//! Base58 helpers for the key material and nonces carried in deep-link URLs.

use crate::error::CryptoError;
use crate::random::NONCE_SIZE;

/// Encode raw bytes as Base58 (Bitcoin alphabet, as used by Solana wallets).
pub fn to_base58(bytes: &[u8]) -> String {
    bs58::encode(bytes).into_string()
}

/// Decode an arbitrary-length Base58 string.
pub fn from_base58(encoded: &str) -> Result<Vec<u8>, CryptoError> {
    bs58::decode(encoded)
        .into_vec()
        .map_err(|e| CryptoError::InvalidEncoding(format!("base58 decode failed: {e}")))
}

/// Decode a Base58 X25519 public key (exactly 32 bytes).
pub fn public_key_from_base58(encoded: &str) -> Result<[u8; 32], CryptoError> {
    let bytes = from_base58(encoded)?;
    bytes.try_into().map_err(|v: Vec<u8>| {
        CryptoError::InvalidPublicKey(format!("expected 32 bytes, got {}", v.len()))
    })
}

/// Decode a Base58 nonce (exactly 24 bytes).
pub fn nonce_from_base58(encoded: &str) -> Result<[u8; NONCE_SIZE], CryptoError> {
    let bytes = from_base58(encoded)?;
    bytes
        .try_into()
        .map_err(|v: Vec<u8>| CryptoError::InvalidNonce(v.len()))
}
