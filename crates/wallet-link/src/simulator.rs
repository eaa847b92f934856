//! In-process stand-in for the wallet app, for tests.
//!
//! Reads the outbound deep links the way the wallet would and produces the
//! callback URLs it would redirect to.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use session_crypto::encoding::{from_base58, public_key_from_base58, to_base58};
use session_crypto::random::random_bytes_fixed;
use session_crypto::SessionManager;
use url::Url;

use crate::error::LinkError;

#[derive(Serialize)]
struct ConnectData<'a> {
    public_key: String,
    session: &'a str,
}

#[derive(Deserialize)]
struct SignRequest {
    transaction: String,
    session: String,
}

#[derive(Serialize)]
enum SignData {
    #[serde(rename = "transaction")]
    Transaction(String),
    #[serde(rename = "signature")]
    Signature(String),
}

pub struct WalletSimulator {
    signing_key: [u8; 32],
    encryption: SessionManager,
    session_token: Option<String>,
}

fn query(url: &Url) -> HashMap<String, String> {
    url.query_pairs().into_owned().collect()
}

fn param<'a>(q: &'a HashMap<String, String>, name: &'static str) -> Result<&'a str, LinkError> {
    q.get(name).map(String::as_str).ok_or(LinkError::MissingField(name))
}

fn redirect(q: &HashMap<String, String>) -> Result<Url, LinkError> {
    let link = param(q, "redirect_link")?;
    Url::parse(link).map_err(|e| LinkError::InvalidUrl(format!("{link}: {e}")))
}

impl WalletSimulator {
    /// `signing_key` is the user's ed25519 seed.
    pub fn new(signing_key: [u8; 32]) -> Self {
        Self {
            signing_key,
            encryption: SessionManager::new(),
            session_token: None,
        }
    }

    /// The user's Solana address.
    pub fn address(&self) -> [u8; 32] {
        chain_sol::public_key_from_private(&self.signing_key)
    }

    /// Approve a connect request: derive the shared secret with the dApp and
    /// return `{public_key, session}` sealed under it.
    pub fn approve_connect(&mut self, request: &Url) -> Result<Url, LinkError> {
        let q = query(request);
        let dapp_key = public_key_from_base58(param(&q, "dapp_encryption_public_key")?)?;

        let wallet_key = self.encryption.generate_session_keypair();
        self.encryption.derive_shared_secret(&dapp_key)?;
        let token = to_base58(&random_bytes_fixed::<16>());

        let sealed = self.encryption.encrypt(&ConnectData {
            public_key: chain_sol::bytes_to_address(&self.address()),
            session: &token,
        })?;
        self.session_token = Some(token);

        let mut callback = redirect(&q)?;
        callback
            .query_pairs_mut()
            .append_pair("phantom_encryption_public_key", &to_base58(&wallet_key))
            .append_pair("nonce", &sealed.nonce_base58())
            .append_pair("data", &sealed.ciphertext_base58());
        Ok(callback)
    }

    /// Open a sign request and check its session token. A token this wallet
    /// never issued yields an `Unauthorized` callback instead of the bytes.
    fn open_sign_request(&self, request: &Url) -> Result<Result<Vec<u8>, Url>, LinkError> {
        let q = query(request);
        let nonce = from_base58(param(&q, "nonce")?)?;
        let payload = from_base58(param(&q, "payload")?)?;
        let opened: SignRequest = self.encryption.decrypt(&payload, &nonce)?;

        if self.session_token.as_deref() != Some(opened.session.as_str()) {
            let denied = self.reject(request, 4100, "The requested method and/or account has not been authorized by the user.")?;
            return Ok(Err(denied));
        }
        Ok(Ok(from_base58(&opened.transaction)?))
    }

    fn sealed_callback(&self, request: &Url, data: &SignData) -> Result<Url, LinkError> {
        let sealed = self.encryption.encrypt(data)?;
        let mut callback = redirect(&query(request))?;
        callback
            .query_pairs_mut()
            .append_pair("nonce", &sealed.nonce_base58())
            .append_pair("data", &sealed.ciphertext_base58());
        Ok(callback)
    }

    /// Sign the requested transaction and return it in the callback.
    pub fn approve_sign(&self, request: &Url) -> Result<Url, LinkError> {
        let unsigned = match self.open_sign_request(request)? {
            Ok(tx) => tx,
            Err(rejection) => return Ok(rejection),
        };
        let signed = chain_sol::sign_wire_transaction(&self.signing_key, &unsigned)
            .map_err(|e| LinkError::MalformedPayload(e.to_string()))?;
        self.sealed_callback(request, &SignData::Transaction(to_base58(&signed)))
    }

    /// Return the requested bytes untouched, as if signing were a no-op.
    /// Useful when the payload is not a real transaction.
    pub fn echo_sign(&self, request: &Url) -> Result<Url, LinkError> {
        match self.open_sign_request(request)? {
            Ok(tx) => self.sealed_callback(request, &SignData::Transaction(to_base58(&tx))),
            Err(rejection) => Ok(rejection),
        }
    }

    /// Sign-and-send: returns the callback carrying only the signature, plus
    /// the signed bytes so the test can submit them itself.
    pub fn approve_sign_and_send(&self, request: &Url) -> Result<(Url, Vec<u8>), LinkError> {
        let unsigned = match self.open_sign_request(request)? {
            Ok(tx) => tx,
            Err(rejection) => return Ok((rejection, Vec::new())),
        };
        let signed = chain_sol::sign_wire_transaction(&self.signing_key, &unsigned)
            .map_err(|e| LinkError::MalformedPayload(e.to_string()))?;
        let signature = chain_sol::decode_transaction(&signed)
            .and_then(|d| d.signature())
            .map_err(|e| LinkError::MalformedPayload(e.to_string()))?;
        let callback = self.sealed_callback(request, &SignData::Signature(signature))?;
        Ok((callback, signed))
    }

    /// Error callback with `errorCode` / `errorMessage`.
    pub fn reject(&self, request: &Url, code: i64, message: &str) -> Result<Url, LinkError> {
        let mut callback = redirect(&query(request))?;
        callback
            .query_pairs_mut()
            .append_pair("errorCode", &code.to_string())
            .append_pair("errorMessage", message);
        Ok(callback)
    }

    /// Acknowledge a disconnect and forget the session.
    pub fn approve_disconnect(&mut self, request: &Url) -> Result<Url, LinkError> {
        let callback = redirect(&query(request))?;
        self.session_token = None;
        self.encryption.clear_session();
        Ok(callback)
    }
}
