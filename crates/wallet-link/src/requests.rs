//! Outbound deep links to the wallet.
//!
//! ```text
//! {base}/connect?app_url=&dapp_encryption_public_key=&redirect_link=&cluster=
//! {base}/signTransaction?dapp_encryption_public_key=&nonce=&redirect_link=&payload=
//! {base}/signAndSendTransaction?  (same parameters, deprecated)
//! {base}/disconnect?              (same parameters)
//! ```
//!
//! Only the connect request travels in clear; it carries nothing but public
//! key material. Every later payload is sealed with the session's shared
//! secret.

use std::fmt;

use chain_sol::Cluster;
use serde::Serialize;
use session_crypto::encoding::to_base58;
use session_crypto::{CryptoError, SessionManager};
use tracing::debug;
use url::Url;

use crate::error::LinkError;

/// Wallet methods this dApp calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Connect,
    SignTransaction,
    SignAndSendTransaction,
    Disconnect,
}

impl RequestKind {
    /// Path segment appended to the wallet's base URL.
    pub fn method(&self) -> &'static str {
        match self {
            RequestKind::Connect => "connect",
            RequestKind::SignTransaction => "signTransaction",
            RequestKind::SignAndSendTransaction => "signAndSendTransaction",
            RequestKind::Disconnect => "disconnect",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}

/// How the dApp identifies itself to the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppMetadata {
    /// Shown to the user and used by the wallet to fetch app metadata.
    pub app_url: String,
    /// Where the wallet sends its callback.
    pub redirect_link: String,
    pub cluster: Cluster,
}

#[derive(Serialize)]
struct SignPayload<'a> {
    transaction: String,
    session: &'a str,
}

#[derive(Serialize)]
struct DisconnectPayload<'a> {
    session: &'a str,
}

fn method_url(endpoint: &Url, kind: RequestKind) -> Result<Url, LinkError> {
    let mut url = endpoint.clone();
    url.path_segments_mut()
        .map_err(|_| LinkError::InvalidUrl(format!("{endpoint} cannot carry a path")))?
        .pop_if_empty()
        .push(kind.method());
    Ok(url)
}

/// Connect request. Generates the session keypair on first use.
pub fn build_connect_request(
    endpoint: &Url,
    session: &mut SessionManager,
    app: &AppMetadata,
) -> Result<Url, LinkError> {
    let public_key = session.generate_session_keypair();

    let mut url = method_url(endpoint, RequestKind::Connect)?;
    url.query_pairs_mut()
        .append_pair("app_url", &app.app_url)
        .append_pair("dapp_encryption_public_key", &to_base58(&public_key))
        .append_pair("redirect_link", &app.redirect_link)
        .append_pair("cluster", app.cluster.as_str());

    debug!(cluster = app.cluster.as_str(), "built connect request");
    Ok(url)
}

fn encrypted_request<T: Serialize>(
    endpoint: &Url,
    kind: RequestKind,
    session: &SessionManager,
    payload: &T,
    redirect_link: &str,
) -> Result<Url, LinkError> {
    let public_key = session.public_key().ok_or(CryptoError::NoActiveSession)?;
    let sealed = session.encrypt(payload)?;

    let mut url = method_url(endpoint, kind)?;
    url.query_pairs_mut()
        .append_pair("dapp_encryption_public_key", &to_base58(&public_key))
        .append_pair("nonce", &sealed.nonce_base58())
        .append_pair("redirect_link", redirect_link)
        .append_pair("payload", &sealed.ciphertext_base58());

    debug!(method = kind.method(), "built encrypted wallet request");
    Ok(url)
}

/// Ask the wallet to sign `transaction` (unsigned wire bytes) and hand the
/// signed bytes back. Preferred path: the dApp broadcasts.
pub fn build_sign_request(
    endpoint: &Url,
    session: &SessionManager,
    transaction: &[u8],
    session_token: &str,
    redirect_link: &str,
) -> Result<Url, LinkError> {
    let payload = SignPayload {
        transaction: to_base58(transaction),
        session: session_token,
    };
    encrypted_request(endpoint, RequestKind::SignTransaction, session, &payload, redirect_link)
}

/// Ask the wallet to sign and submit `transaction` itself. Deprecated by
/// wallets; kept for compatibility.
pub fn build_sign_and_send_request(
    endpoint: &Url,
    session: &SessionManager,
    transaction: &[u8],
    session_token: &str,
    redirect_link: &str,
) -> Result<Url, LinkError> {
    let payload = SignPayload {
        transaction: to_base58(transaction),
        session: session_token,
    };
    encrypted_request(
        endpoint,
        RequestKind::SignAndSendTransaction,
        session,
        &payload,
        redirect_link,
    )
}

pub fn build_disconnect_request(
    endpoint: &Url,
    session: &SessionManager,
    session_token: &str,
    redirect_link: &str,
) -> Result<Url, LinkError> {
    let payload = DisconnectPayload {
        session: session_token,
    };
    encrypted_request(endpoint, RequestKind::Disconnect, session, &payload, redirect_link)
}
