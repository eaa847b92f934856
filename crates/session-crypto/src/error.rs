use thiserror::Error;

/// Session key management and encryption errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("no session keypair: generate one before deriving a shared secret")]
    NoKeypair,

    #[error("no active session: shared secret has not been derived")]
    NoActiveSession,

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid nonce: expected 24 bytes, got {0}")]
    InvalidNonce(usize),

    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("payload serialization failed: {0}")]
    Serialization(String),
}
