use rand::RngCore;
use rand_core::OsRng;

/// NaCl `box` nonce size in bytes.
pub const NONCE_SIZE: usize = 24;

/// Generates a fixed-size array of cryptographically secure random bytes.
pub fn random_bytes_fixed<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    OsRng.fill_bytes(&mut buf);
    buf
}

/// Generates a fresh 24-byte nonce for a single sealed message.
///
/// XSalsa20's 192-bit nonce space is large enough that random nonces never
/// collide in practice, so no counter is kept per session.
pub fn random_nonce() -> [u8; NONCE_SIZE] {
    random_bytes_fixed::<NONCE_SIZE>()
}
