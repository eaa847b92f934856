//! The app's single owned session: wallet pairing, the transaction the
//! wallet is currently signing, and local history.
//!
//! Everything here is synchronous. [`crate::DappClient`] locks it only
//! between network calls.

use chain_sol::{bytes_to_address, decode_transaction, UnsignedTransaction};
use tracing::{info, warn};
use url::Url;
use wallet_link::{ConnectionState, PairingProtocol, SignResponse};

use crate::config::DappConfig;
use crate::error::DappError;
use crate::history::{TransactionHistory, TransactionKind, TransactionRecord, TransactionStatus};

/// What the wallet is being asked to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionIntent {
    pub kind: TransactionKind,
    pub amount: u64,
    pub last_valid_block_height: u64,
}

/// A wallet answer ready for the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignedSubmission {
    /// Signed bytes the dApp must broadcast.
    Broadcast {
        transaction: Vec<u8>,
        signature: String,
        intent: SubmissionIntent,
    },
    /// The wallet broadcast it already.
    AlreadySent {
        signature: String,
        intent: SubmissionIntent,
    },
}

pub struct DappSession {
    pairing: PairingProtocol,
    history: TransactionHistory,
    in_flight: Option<SubmissionIntent>,
}

impl DappSession {
    pub fn new(config: &DappConfig) -> Result<Self, DappError> {
        let pairing = PairingProtocol::new(
            &config.wallet_base_url,
            config.app_metadata(),
            config.pending_request_ttl(),
        )?;
        Ok(Self {
            pairing,
            history: TransactionHistory::new(config.history_capacity),
            in_flight: None,
        })
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.pairing.state()
    }

    pub fn wallet(&self) -> Option<[u8; 32]> {
        self.pairing.wallet_public_key()
    }

    pub fn require_wallet(&self) -> Result<[u8; 32], DappError> {
        self.wallet().ok_or(DappError::NotConnected)
    }

    pub fn history(&self) -> &TransactionHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut TransactionHistory {
        &mut self.history
    }

    pub fn replace_history(&mut self, history: TransactionHistory) {
        self.history = history;
    }

    pub fn connect(&mut self) -> Result<Url, DappError> {
        Ok(self.pairing.connect()?)
    }

    pub fn complete_connect(&mut self, callback: &Url) -> Result<[u8; 32], DappError> {
        Ok(self.pairing.handle_connect_callback(callback)?)
    }

    /// Hand `unsigned` to the wallet. Only one transaction can be out for
    /// signing at a time; the pairing layer enforces that.
    pub fn request_signature(
        &mut self,
        unsigned: &UnsignedTransaction,
        kind: TransactionKind,
        amount: u64,
        wallet_broadcasts: bool,
    ) -> Result<Url, DappError> {
        let wire = unsigned.wire_bytes()?;
        let url = if wallet_broadcasts {
            self.pairing.sign_and_send_transaction(&wire)?
        } else {
            self.pairing.sign_transaction(&wire)?
        };
        self.in_flight = Some(SubmissionIntent {
            kind,
            amount,
            last_valid_block_height: unsigned.last_valid_block_height,
        });
        Ok(url)
    }

    /// Decrypt the sign callback and add a `Pending` history entry.
    pub fn complete_signature(&mut self, callback: &Url) -> Result<SignedSubmission, DappError> {
        let response = match self.pairing.handle_sign_callback(callback) {
            Ok(response) => response,
            Err(e) => {
                // Any definitive wallet answer consumes the intent.
                if self.pairing.pending_request().is_none() {
                    self.in_flight = None;
                }
                return Err(e.into());
            }
        };
        let intent = self
            .in_flight
            .take()
            .ok_or_else(|| DappError::Protocol("sign callback without a submission".into()))?;

        let submission = match response {
            SignResponse::Signed { transaction } => {
                let decoded = decode_transaction(&transaction)?;
                let wallet = self.require_wallet()?;
                if decoded.message.fee_payer() != Some(&wallet) {
                    return Err(DappError::Protocol(
                        "wallet returned a transaction paid by another account".into(),
                    ));
                }
                let signature = decoded.signature()?;
                SignedSubmission::Broadcast {
                    transaction,
                    signature,
                    intent,
                }
            }
            SignResponse::Sent { signature } => SignedSubmission::AlreadySent { signature, intent },
        };

        let (signature, intent) = match &submission {
            SignedSubmission::Broadcast { signature, intent, .. }
            | SignedSubmission::AlreadySent { signature, intent } => (signature, intent),
        };
        self.history
            .push(TransactionRecord::new(signature.clone(), intent.kind, intent.amount));
        Ok(submission)
    }

    pub fn record(&mut self, signature: &str, status: TransactionStatus) {
        if !self.history.update_status(signature, status) {
            warn!(%signature, ?status, "status update for unknown transaction");
        }
    }

    pub fn disconnect(&mut self) -> Result<Url, DappError> {
        let wallet = self.wallet().map(|w| bytes_to_address(&w));
        let url = self.pairing.disconnect()?;
        self.in_flight = None;
        info!(wallet = ?wallet, "session closed");
        Ok(url)
    }

    pub fn complete_disconnect(&self, callback: &Url) -> Result<(), DappError> {
        Ok(self.pairing.handle_disconnect_callback(callback)?)
    }

    pub fn abandon_pending(&mut self) -> bool {
        self.in_flight = None;
        self.pairing.abandon_pending().is_some()
    }

    /// Drop all session keys without talking to the wallet.
    pub fn reset(&mut self) {
        self.pairing.clear_session();
        self.in_flight = None;
    }
}
