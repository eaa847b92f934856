//! # session-crypto
//!
//! Key agreement and authenticated encryption for the wallet deep-link
//! session: an X25519 keypair per app session, a NaCl `box` shared secret per
//! counterpart wallet, and JSON payloads sealed under 24-byte random nonces.

pub mod encoding;
pub mod encryption;
pub mod error;
pub mod random;
pub mod session;
pub mod zeroizing;

pub use encryption::EncryptedPayload;
pub use error::CryptoError;
pub use session::SessionManager;
pub use zeroizing::{ZeroizingBytes, ZeroizingString};
