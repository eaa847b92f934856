//! The single live session keypair and the shared secret derived from it.
//!
//! Lifecycle: `generate_session_keypair` once per app session, then
//! `derive_shared_secret` with the wallet's public key from the connect
//! callback. Every outgoing payload is sealed with that secret and every
//! callback payload is opened with it. `clear_session` drops everything, and
//! a fresh keypair must be generated before the next exchange.

use crypto_box::{PublicKey, SalsaBox, SecretKey};
use rand_core::OsRng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::encryption::{self, EncryptedPayload};
use crate::error::CryptoError;
use crate::random::NONCE_SIZE;

/// Shared secret bound to one counterpart public key.
struct ActiveSession {
    counterpart: [u8; 32],
    cipher: SalsaBox,
}

/// Owns the local X25519 keypair and at most one derived shared secret.
#[derive(Default)]
pub struct SessionManager {
    secret: Option<SecretKey>,
    active: Option<ActiveSession>,
}

impl SessionManager {
    /// An empty manager: no keypair, no session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session public key, generating a keypair if none exists.
    ///
    /// Calling this again while a keypair is cached returns the same key.
    pub fn generate_session_keypair(&mut self) -> [u8; 32] {
        if let Some(secret) = &self.secret {
            return secret.public_key().to_bytes();
        }

        let secret = SecretKey::generate(&mut OsRng);
        let public = secret.public_key().to_bytes();
        self.secret = Some(secret);
        self.active = None;
        debug!("generated session keypair");
        public
    }

    /// The cached public key, if a keypair exists.
    pub fn public_key(&self) -> Option<[u8; 32]> {
        self.secret.as_ref().map(|s| s.public_key().to_bytes())
    }

    /// Computes the NaCl `box` shared secret with `counterpart_public_key` and
    /// makes it the active one. Any previously derived secret is replaced.
    pub fn derive_shared_secret(&mut self, counterpart_public_key: &[u8; 32]) -> Result<(), CryptoError> {
        let secret = self.secret.as_ref().ok_or(CryptoError::NoKeypair)?;
        let counterpart = PublicKey::from(*counterpart_public_key);

        self.active = Some(ActiveSession {
            counterpart: *counterpart_public_key,
            cipher: SalsaBox::new(&counterpart, secret),
        });
        debug!("derived shared secret with counterpart");
        Ok(())
    }

    /// True once a shared secret has been derived and not cleared.
    pub fn has_active_session(&self) -> bool {
        self.active.is_some()
    }

    /// The wallet key the active shared secret was derived with.
    pub fn counterpart_public_key(&self) -> Option<[u8; 32]> {
        self.active.as_ref().map(|a| a.counterpart)
    }

    /// Serializes `payload` as JSON and seals it under a fresh nonce.
    pub fn encrypt<T: Serialize>(&self, payload: &T) -> Result<EncryptedPayload, CryptoError> {
        let active = self.active.as_ref().ok_or(CryptoError::NoActiveSession)?;
        let plaintext = serde_json::to_vec(payload)
            .map(crate::ZeroizingBytes::new)
            .map_err(|e| CryptoError::Serialization(e.to_string()))?;

        encryption::seal(&active.cipher, &plaintext)
    }

    /// Opens a payload sealed by the counterpart and parses it as JSON.
    pub fn decrypt<T: DeserializeOwned>(&self, ciphertext: &[u8], nonce: &[u8]) -> Result<T, CryptoError> {
        let active = self.active.as_ref().ok_or(CryptoError::NoActiveSession)?;
        open_json(&active.cipher, ciphertext, nonce)
    }

    /// Derives the shared secret for `counterpart_public_key`, decrypts, and
    /// hands the payload to `accept`. The derived secret is kept only if both
    /// decryption and `accept` succeed, so a forged or malformed connect
    /// callback leaves the manager as it was.
    pub fn decrypt_with<T, U, E>(
        &mut self,
        counterpart_public_key: &[u8; 32],
        ciphertext: &[u8],
        nonce: &[u8],
        accept: impl FnOnce(T) -> Result<U, E>,
    ) -> Result<U, E>
    where
        T: DeserializeOwned,
        E: From<CryptoError>,
    {
        let secret = self.secret.as_ref().ok_or(CryptoError::NoKeypair)?;
        let cipher = SalsaBox::new(&PublicKey::from(*counterpart_public_key), secret);

        let value = accept(open_json(&cipher, ciphertext, nonce)?)?;
        self.active = Some(ActiveSession {
            counterpart: *counterpart_public_key,
            cipher,
        });
        debug!("connect handshake decrypted, session active");
        Ok(value)
    }

    /// Discards the keypair, the shared secret and the counterpart key.
    pub fn clear_session(&mut self) {
        self.active = None;
        self.secret = None;
        debug!("session cleared");
    }
}

fn open_json<T: DeserializeOwned>(
    cipher: &SalsaBox,
    ciphertext: &[u8],
    nonce: &[u8],
) -> Result<T, CryptoError> {
    let nonce: [u8; NONCE_SIZE] = nonce
        .try_into()
        .map_err(|_| CryptoError::InvalidNonce(nonce.len()))?;
    let payload = EncryptedPayload {
        nonce,
        ciphertext: ciphertext.to_vec(),
    };

    let plaintext = encryption::open(cipher, &payload)?;
    serde_json::from_slice(&plaintext).map_err(|e| CryptoError::Serialization(e.to_string()))
}
