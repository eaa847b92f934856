use crypto_box::aead::Aead;
use crypto_box::{Nonce, SalsaBox};

use crate::encoding::{from_base58, nonce_from_base58, to_base58};
use crate::error::CryptoError;
use crate::random::{random_nonce, NONCE_SIZE};
use crate::zeroizing::ZeroizingBytes;

/// A sealed message: the 24-byte nonce it was sealed under plus the
/// ciphertext (plaintext length + 16-byte Poly1305 tag).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPayload {
    pub nonce: [u8; NONCE_SIZE],
    pub ciphertext: Vec<u8>,
}

impl EncryptedPayload {
    /// Decodes a payload from the Base58 `nonce` and `data` query values.
    pub fn from_base58(nonce: &str, ciphertext: &str) -> Result<Self, CryptoError> {
        Ok(Self {
            nonce: nonce_from_base58(nonce)?,
            ciphertext: from_base58(ciphertext)?,
        })
    }

    pub fn nonce_base58(&self) -> String {
        to_base58(&self.nonce)
    }

    pub fn ciphertext_base58(&self) -> String {
        to_base58(&self.ciphertext)
    }
}

/// Seals `plaintext` under a fresh random nonce.
pub fn seal(cipher: &SalsaBox, plaintext: &[u8]) -> Result<EncryptedPayload, CryptoError> {
    let nonce = random_nonce();
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    Ok(EncryptedPayload { nonce, ciphertext })
}

/// Opens a sealed message. Authentication failure never yields plaintext.
pub fn open(cipher: &SalsaBox, payload: &EncryptedPayload) -> Result<ZeroizingBytes, CryptoError> {
    cipher
        .decrypt(Nonce::from_slice(&payload.nonce), payload.ciphertext.as_slice())
        .map(ZeroizingBytes::new)
        .map_err(|_| CryptoError::DecryptionFailed("authentication tag mismatch".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crypto_box::SecretKey;
    use rand_core::OsRng;

    fn paired_boxes() -> (SalsaBox, SalsaBox) {
        let alice = SecretKey::generate(&mut OsRng);
        let bob = SecretKey::generate(&mut OsRng);
        (
            SalsaBox::new(&bob.public_key(), &alice),
            SalsaBox::new(&alice.public_key(), &bob),
        )
    }

    #[test]
    fn seal_open_roundtrip() {
        let (alice, bob) = paired_boxes();
        let sealed = seal(&alice, b"hello wallet").unwrap();
        let opened = open(&bob, &sealed).unwrap();
        assert_eq!(&*opened, b"hello wallet");
    }

    #[test]
    fn ciphertext_carries_tag() {
        let (alice, _) = paired_boxes();
        let sealed = seal(&alice, b"abc").unwrap();
        assert_eq!(sealed.ciphertext.len(), 3 + 16);
    }

    #[test]
    fn each_seal_uses_a_fresh_nonce() {
        let (alice, _) = paired_boxes();
        let a = seal(&alice, b"same").unwrap();
        let b = seal(&alice, b"same").unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let (alice, bob) = paired_boxes();
        let mut sealed = seal(&alice, b"transfer 1 SOL").unwrap();
        sealed.ciphertext[0] ^= 0x01;
        assert!(matches!(
            open(&bob, &sealed),
            Err(CryptoError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn wrong_nonce_fails() {
        let (alice, bob) = paired_boxes();
        let mut sealed = seal(&alice, b"payload").unwrap();
        sealed.nonce[23] ^= 0xFF;
        assert!(open(&bob, &sealed).is_err());
    }

    #[test]
    fn base58_accessors_roundtrip() {
        let (alice, _) = paired_boxes();
        let sealed = seal(&alice, b"{}").unwrap();
        let decoded =
            EncryptedPayload::from_base58(&sealed.nonce_base58(), &sealed.ciphertext_base58())
                .unwrap();
        assert_eq!(decoded, sealed);
    }

    #[test]
    fn from_base58_rejects_short_nonce() {
        let nonce = to_base58(&[0u8; 12]);
        let data = to_base58(&[0u8; 20]);
        assert!(matches!(
            EncryptedPayload::from_base58(&nonce, &data),
            Err(CryptoError::InvalidNonce(12))
        ));
    }
}
