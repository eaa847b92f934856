//! Program Derived Address derivation.
//!
//! A PDA is `SHA-256(seed_0 || .. || seed_n || bump || program_id ||
//! "ProgramDerivedAddress")` for the highest bump (255 down to 0) whose hash
//! is NOT a valid Ed25519 point, so no private key can ever sign for it.

use sha2::{Digest, Sha256};

use crate::error::SolError;

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Maximum number of seeds and maximum length of a single seed.
pub const MAX_SEEDS: usize = 16;
pub const MAX_SEED_LEN: usize = 32;

/// Find the canonical PDA and its bump for `seeds` under `program_id`.
pub fn find_program_address(
    seeds: &[&[u8]],
    program_id: &[u8; 32],
) -> Result<([u8; 32], u8), SolError> {
    for bump in (0u8..=255).rev() {
        if let Ok(address) = create_program_address(seeds, bump, program_id) {
            return Ok((address, bump));
        }
    }

    Err(SolError::InvalidAddress(
        "could not find valid PDA bump seed".into(),
    ))
}

/// Derive the address for an explicit bump. Fails if the result lies on the
/// curve or the seeds are out of bounds.
pub fn create_program_address(
    seeds: &[&[u8]],
    bump: u8,
    program_id: &[u8; 32],
) -> Result<[u8; 32], SolError> {
    if seeds.len() + 1 > MAX_SEEDS {
        return Err(SolError::InvalidAddress(format!(
            "too many seeds: {}",
            seeds.len()
        )));
    }
    if let Some(seed) = seeds.iter().find(|s| s.len() > MAX_SEED_LEN) {
        return Err(SolError::InvalidAddress(format!(
            "seed too long: {} bytes",
            seed.len()
        )));
    }

    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update([bump]);
    hasher.update(program_id);
    hasher.update(PDA_MARKER);
    let hash: [u8; 32] = hasher.finalize().into();

    if is_on_curve(&hash) {
        return Err(SolError::InvalidAddress(format!(
            "bump {bump} yields an on-curve address"
        )));
    }
    Ok(hash)
}

/// Whether 32 bytes decompress to an Ed25519 point.
pub fn is_on_curve(bytes: &[u8; 32]) -> bool {
    curve25519_dalek::edwards::CompressedEdwardsY(*bytes)
        .decompress()
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{address_to_bytes, bytes_to_address};

    const TOKEN_PROGRAM: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
    const ATA_PROGRAM: &str = "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL";
    const STATE_SEED: &[u8] = b"program_state";

    #[test]
    fn derives_known_associated_token_address() {
        // USDC associated token account of a mainnet wallet.
        let wallet = address_to_bytes("7EcDhSYGxXyscszYEp35KHN8vvw3svAuLKTzXwCFLtV").unwrap();
        let mint = address_to_bytes("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v").unwrap();
        let token = address_to_bytes(TOKEN_PROGRAM).unwrap();
        let ata = address_to_bytes(ATA_PROGRAM).unwrap();

        let (address, bump) =
            find_program_address(&[wallet.as_ref(), token.as_ref(), mint.as_ref()], &ata).unwrap();
        assert_eq!(
            bytes_to_address(&address),
            "42JrewdefrETKYFymk8F8FCtJSxLpQQjSyLb4GwueWHG"
        );
        assert_eq!(bump, 254);
        assert!(!is_on_curve(&address));
    }

    #[test]
    fn find_and_create_agree() {
        let program = [7u8; 32];
        let (address, bump) = find_program_address(&[STATE_SEED], &program).unwrap();
        assert_eq!(
            create_program_address(&[STATE_SEED], bump, &program).unwrap(),
            address
        );
    }

    #[test]
    fn derivation_is_deterministic_and_seed_sensitive() {
        let program = [9u8; 32];
        let (a, _) = find_program_address(&[STATE_SEED], &program).unwrap();
        let (b, _) = find_program_address(&[STATE_SEED], &program).unwrap();
        let (c, _) = find_program_address(&[b"other".as_ref()], &program).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(bytes_to_address(&a), bytes_to_address(&program));
    }

    #[test]
    fn overlong_seed_rejected() {
        let seed = [0u8; 33];
        assert!(create_program_address(&[seed.as_ref()], 255, &[1u8; 32]).is_err());
    }

    #[test]
    fn real_public_key_is_on_curve() {
        let key = ed25519_dalek::SigningKey::from_bytes(&[42u8; 32]);
        assert!(is_on_curve(&key.verifying_key().to_bytes()));
    }
}
