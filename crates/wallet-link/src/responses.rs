//! Inbound wallet callbacks.
//!
//! Success: `phantom_encryption_public_key` (connect only), `nonce`, `data`.
//! Failure: `errorCode`, `errorMessage`. A failure callback is reported as
//! [`LinkError::Rejected`] without touching any key material.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use session_crypto::encoding::{from_base58, public_key_from_base58};
use session_crypto::{SessionManager, ZeroizingString};
use tracing::{debug, warn};
use url::Url;

use crate::error::{LinkError, WalletRejection};

/// Result of a successful connect handshake.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectedWallet {
    /// The user's Solana address.
    pub public_key: [u8; 32],
    /// Wallet-issued token that must accompany every later request.
    pub session: ZeroizingString,
}

impl fmt::Debug for ConnectedWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectedWallet")
            .field("public_key", &chain_sol::bytes_to_address(&self.public_key))
            .field("session", &self.session)
            .finish()
    }
}

/// What the wallet returned for a signing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignResponse {
    /// Signed but not broadcast. The caller must broadcast the bytes.
    Signed { transaction: Vec<u8> },
    /// Already broadcast by the wallet (deprecated sign-and-send path).
    Sent { signature: String },
}

#[derive(Deserialize)]
struct ConnectData {
    public_key: String,
    session: ZeroizingString,
}

#[derive(Deserialize)]
struct SignData {
    transaction: Option<String>,
    signature: Option<String>,
}

/// Query parameters of a callback URL.
struct CallbackParams(HashMap<String, String>);

impl CallbackParams {
    fn from_url(url: &Url) -> Self {
        Self(url.query_pairs().into_owned().collect())
    }

    fn required(&self, name: &'static str) -> Result<&str, LinkError> {
        self.0
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .ok_or(LinkError::MissingField(name))
    }

    fn rejection(&self) -> Result<Option<WalletRejection>, LinkError> {
        let Some(code) = self.0.get("errorCode") else {
            return Ok(None);
        };
        let code = code
            .trim()
            .parse::<i64>()
            .map_err(|_| LinkError::MalformedPayload(format!("non-numeric errorCode `{code}`")))?;
        let message = self
            .0
            .get("errorMessage")
            .cloned()
            .unwrap_or_default();
        Ok(Some(WalletRejection { code, message }))
    }

    fn reject_if_error(&self) -> Result<(), LinkError> {
        match self.rejection()? {
            Some(rejection) => {
                warn!(code = rejection.code, message = %rejection.message, "wallet rejected request");
                Err(LinkError::Rejected(rejection))
            }
            None => Ok(()),
        }
    }
}

/// Parse the connect callback, derive the shared secret and recover the
/// wallet address and session token.
///
/// The shared secret is only kept if the payload authenticates and carries a
/// valid address and token, so a rejected, forged or malformed callback
/// leaves `session` as it was.
pub fn parse_connect_response(
    session: &mut SessionManager,
    url: &Url,
) -> Result<ConnectedWallet, LinkError> {
    let params = CallbackParams::from_url(url);
    params.reject_if_error()?;

    let wallet_key = public_key_from_base58(params.required("phantom_encryption_public_key")?)?;
    let nonce = from_base58(params.required("nonce")?)?;
    let data = from_base58(params.required("data")?)?;

    let wallet = session.decrypt_with(&wallet_key, &data, &nonce, |decrypted: ConnectData| {
        let public_key = chain_sol::address_to_bytes(&decrypted.public_key)
            .map_err(|e| LinkError::MalformedPayload(format!("public_key: {e}")))?;
        if decrypted.session.is_empty() {
            return Err(LinkError::MalformedPayload("empty session token".into()));
        }
        Ok(ConnectedWallet {
            public_key,
            session: decrypted.session,
        })
    })?;

    debug!(wallet = %chain_sol::bytes_to_address(&wallet.public_key), "connect callback decrypted");
    Ok(wallet)
}

/// Parse a `signTransaction` or `signAndSendTransaction` callback.
pub fn parse_sign_response(session: &SessionManager, url: &Url) -> Result<SignResponse, LinkError> {
    let params = CallbackParams::from_url(url);
    params.reject_if_error()?;

    let nonce = from_base58(params.required("nonce")?)?;
    let data = from_base58(params.required("data")?)?;
    let decrypted: SignData = session.decrypt(&data, &nonce)?;

    match (decrypted.transaction, decrypted.signature) {
        (Some(tx), None) => {
            let transaction = from_base58(&tx)
                .map_err(|e| LinkError::MalformedPayload(format!("transaction: {e}")))?;
            if transaction.is_empty() {
                return Err(LinkError::MalformedPayload("empty transaction".into()));
            }
            Ok(SignResponse::Signed { transaction })
        }
        (None, Some(signature)) => {
            chain_sol::signature_from_str(&signature)
                .map_err(|e| LinkError::MalformedPayload(format!("signature: {e}")))?;
            Ok(SignResponse::Sent { signature })
        }
        (Some(_), Some(_)) => Err(LinkError::MalformedPayload(
            "both transaction and signature present".into(),
        )),
        (None, None) => Err(LinkError::MalformedPayload(
            "neither transaction nor signature present".into(),
        )),
    }
}

/// Parse a `disconnect` callback. Success carries no payload.
pub fn parse_disconnect_response(url: &Url) -> Result<(), LinkError> {
    CallbackParams::from_url(url).reject_if_error()
}
