//! Connection state machine around the request and callback functions.
//!
//! `Disconnected -> Connecting -> Connected -> (sign round trips) -> Disconnected`
//!
//! At most one request waits for the wallet at a time. A second request
//! while one is pending fails with [`LinkError::RequestPending`] unless the
//! pending one is older than the configured TTL, in which case it is treated
//! as abandoned (the user never came back from the wallet) and replaced.

use std::time::{Duration, Instant};

use session_crypto::{CryptoError, SessionManager};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::LinkError;
use crate::requests::{
    build_connect_request, build_disconnect_request, build_sign_and_send_request,
    build_sign_request, AppMetadata, RequestKind,
};
use crate::responses::{
    parse_connect_response, parse_disconnect_response, parse_sign_response, ConnectedWallet,
    SignResponse,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, Copy)]
struct PendingRequest {
    kind: RequestKind,
    issued_at: Instant,
}

pub struct PairingProtocol {
    endpoint: Url,
    app: AppMetadata,
    session: SessionManager,
    state: ConnectionState,
    wallet: Option<ConnectedWallet>,
    pending: Option<PendingRequest>,
    pending_ttl: Duration,
}

impl PairingProtocol {
    /// Fails if `wallet_base_url` does not parse.
    pub fn new(wallet_base_url: &str, app: AppMetadata, pending_ttl: Duration) -> Result<Self, LinkError> {
        let endpoint = Url::parse(wallet_base_url)
            .map_err(|e| LinkError::InvalidUrl(format!("{wallet_base_url}: {e}")))?;
        Ok(Self {
            endpoint,
            app,
            session: SessionManager::new(),
            state: ConnectionState::Disconnected,
            wallet: None,
            pending: None,
            pending_ttl,
        })
    }

    /// Current position in the connection state machine.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The connected wallet's Solana address.
    pub fn wallet_public_key(&self) -> Option<[u8; 32]> {
        self.wallet.as_ref().map(|w| w.public_key)
    }

    /// The request awaiting a wallet callback, if any.
    pub fn pending_request(&self) -> Option<RequestKind> {
        self.pending.map(|p| p.kind)
    }

    /// Metadata sent with every connect request.
    pub fn app(&self) -> &AppMetadata {
        &self.app
    }

    fn reserve(&mut self, kind: RequestKind) -> Result<(), LinkError> {
        if let Some(pending) = self.pending {
            if pending.issued_at.elapsed() < self.pending_ttl {
                return Err(LinkError::RequestPending(pending.kind));
            }
            warn!(abandoned = %pending.kind, "replacing stale pending request");
            if pending.kind == RequestKind::Connect && self.state == ConnectionState::Connecting {
                self.state = ConnectionState::Disconnected;
            }
        }
        self.pending = Some(PendingRequest {
            kind,
            issued_at: Instant::now(),
        });
        Ok(())
    }

    fn expect_pending(&self, kinds: &[RequestKind], callback: RequestKind) -> Result<RequestKind, LinkError> {
        match self.pending {
            Some(p) if kinds.contains(&p.kind) => Ok(p.kind),
            _ => Err(LinkError::UnexpectedCallback(callback)),
        }
    }

    fn connected_wallet(&self) -> Result<&ConnectedWallet, LinkError> {
        match (&self.state, &self.wallet) {
            (ConnectionState::Connected, Some(wallet)) => Ok(wallet),
            _ => Err(CryptoError::NoActiveSession.into()),
        }
    }

    /// Build the connect deep link and start waiting for the callback.
    pub fn connect(&mut self) -> Result<Url, LinkError> {
        if self.state == ConnectionState::Connected {
            return Err(LinkError::AlreadyConnected);
        }
        self.reserve(RequestKind::Connect)?;

        match build_connect_request(&self.endpoint, &mut self.session, &self.app) {
            Ok(url) => {
                self.state = ConnectionState::Connecting;
                info!("connect request issued");
                Ok(url)
            }
            Err(e) => {
                self.pending = None;
                Err(e)
            }
        }
    }

    /// Handle the wallet's connect callback. Returns the wallet address.
    pub fn handle_connect_callback(&mut self, url: &Url) -> Result<[u8; 32], LinkError> {
        if self.session.public_key().is_none() {
            return Err(CryptoError::NoActiveSession.into());
        }
        self.expect_pending(&[RequestKind::Connect], RequestKind::Connect)?;

        match parse_connect_response(&mut self.session, url) {
            Ok(wallet) => {
                let address = wallet.public_key;
                self.wallet = Some(wallet);
                self.pending = None;
                self.state = ConnectionState::Connected;
                info!(wallet = %chain_sol::bytes_to_address(&address), "wallet connected");
                Ok(address)
            }
            // A payload that does not open under the current keypair belongs
            // to an earlier attempt (or is forged); the live attempt stays.
            Err(e @ LinkError::Crypto(_)) => {
                warn!(error = %e, "connect callback ignored");
                Err(e)
            }
            Err(e) => {
                // Any definitive answer ends the attempt. The keypair stays
                // cached so a retry advertises the same key.
                self.pending = None;
                self.state = ConnectionState::Disconnected;
                warn!(error = %e, "connect failed");
                Err(e)
            }
        }
    }

    fn sign_request(&mut self, transaction: &[u8], kind: RequestKind) -> Result<Url, LinkError> {
        let wallet = self.connected_wallet()?;
        let token = wallet.session.clone();
        self.reserve(kind)?;

        let redirect = &self.app.redirect_link;
        let built = match kind {
            RequestKind::SignAndSendTransaction => {
                build_sign_and_send_request(&self.endpoint, &self.session, transaction, &token, redirect)
            }
            _ => build_sign_request(&self.endpoint, &self.session, transaction, &token, redirect),
        };
        if built.is_err() {
            self.pending = None;
        }
        built
    }

    /// Ask the wallet to sign unsigned wire bytes (dApp broadcasts).
    pub fn sign_transaction(&mut self, transaction: &[u8]) -> Result<Url, LinkError> {
        self.sign_request(transaction, RequestKind::SignTransaction)
    }

    /// Deprecated wallet-broadcasts path.
    pub fn sign_and_send_transaction(&mut self, transaction: &[u8]) -> Result<Url, LinkError> {
        self.sign_request(transaction, RequestKind::SignAndSendTransaction)
    }

    /// Handle a sign callback. Decryption is checked first so a callback
    /// arriving after [`Self::clear_session`] fails with `NoActiveSession`.
    pub fn handle_sign_callback(&mut self, url: &Url) -> Result<SignResponse, LinkError> {
        let result = parse_sign_response(&self.session, url);
        if let Err(LinkError::Crypto(_)) = result {
            return result;
        }
        let kind = self.expect_pending(
            &[RequestKind::SignTransaction, RequestKind::SignAndSendTransaction],
            RequestKind::SignTransaction,
        )?;
        self.pending = None;

        match &result {
            Ok(SignResponse::Sent { .. }) if kind == RequestKind::SignTransaction => {
                warn!("wallet broadcast a transaction it was only asked to sign");
            }
            Ok(_) => debug!(method = %kind, "sign callback accepted"),
            Err(e) => warn!(error = %e, "sign request failed"),
        }
        result
    }

    /// Build the disconnect deep link and drop local session state at once.
    /// The wallet's callback, if it ever arrives, is informational.
    pub fn disconnect(&mut self) -> Result<Url, LinkError> {
        let token = self.connected_wallet()?.session.clone();
        let url = build_disconnect_request(
            &self.endpoint,
            &self.session,
            &token,
            &self.app.redirect_link,
        )?;
        self.clear_session();
        info!("disconnected");
        Ok(url)
    }

    /// Parse the wallet's acknowledgement of a disconnect. Local state was
    /// already cleared by [`Self::disconnect`].
    pub fn handle_disconnect_callback(&self, url: &Url) -> Result<(), LinkError> {
        parse_disconnect_response(url)
    }

    /// Give up on the pending request (the user returned without a callback).
    pub fn abandon_pending(&mut self) -> Option<RequestKind> {
        let pending = self.pending.take()?;
        if pending.kind == RequestKind::Connect && self.state == ConnectionState::Connecting {
            self.state = ConnectionState::Disconnected;
        }
        debug!(abandoned = %pending.kind, "pending request abandoned");
        Some(pending.kind)
    }

    /// Forget keypair, shared secret, session token and pending request.
    pub fn clear_session(&mut self) {
        self.session.clear_session();
        self.wallet = None;
        self.pending = None;
        self.state = ConnectionState::Disconnected;
    }
}
