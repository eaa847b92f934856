//! FFI entry point. One `DappClient` per app process.
//!
//! The session mutex is only held for synchronous work; every RPC call
//! happens with the lock released.

use std::sync::{Arc, Mutex, MutexGuard};

use chain_sol::{
    address_to_bytes, broadcast, build_initialize_transaction, build_program_transfer_transaction,
    build_transfer_transaction, bytes_to_address, program_state_address, signature_status,
    HttpRpcClient, ProgramStateAccount, SolError, SolanaRpc, TransferRequest,
};
use tracing::{info, warn};
use url::Url;

use crate::config::DappConfig;
use crate::error::DappError;
use crate::history::{TransactionHistory, TransactionKind, TransactionRecord, TransactionStatus};
use crate::session::{DappSession, SignedSubmission};
use crate::types::{
    status_for_commitment, status_from_network, ConnectionStatus, ProgramStats,
    TransactionReceipt, TransferParams, TransferRoute,
};

#[derive(uniffi::Object)]
pub struct DappClient {
    config: DappConfig,
    rpc: Arc<dyn SolanaRpc>,
    session: Mutex<DappSession>,
}

fn parse_callback(url: &str) -> Result<Url, DappError> {
    Url::parse(url).map_err(|e| DappError::Protocol(format!("callback url `{url}`: {e}")))
}

impl DappClient {
    /// Build a client on any RPC backend.
    pub fn with_rpc(config: DappConfig, rpc: Arc<dyn SolanaRpc>) -> Result<Self, DappError> {
        config.validate()?;
        let session = DappSession::new(&config)?;
        Ok(Self {
            config,
            rpc,
            session: Mutex::new(session),
        })
    }

    fn session(&self) -> MutexGuard<'_, DappSession> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn config(&self) -> &DappConfig {
        &self.config
    }
}

#[uniffi::export(async_runtime = "tokio")]
impl DappClient {
    /// `config_json` is a [`DappConfig`]; omitted fields take defaults.
    #[uniffi::constructor]
    pub fn new(config_json: String) -> Result<Arc<Self>, DappError> {
        let config = DappConfig::from_json(&config_json)?;
        let rpc = HttpRpcClient::new(config.rpc_url(), config.commitment)?;
        info!(cluster = %config.cluster, rpc = config.rpc_url(), "dapp client created");
        Ok(Arc::new(Self::with_rpc(config, Arc::new(rpc))?))
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.session().connection_state().into()
    }

    pub fn wallet_address(&self) -> Option<String> {
        self.session().wallet().map(|w| bytes_to_address(&w))
    }

    // ─── Pairing ─────────────────────────────────────────────────────

    /// Deep link to open in the wallet app.
    pub fn connect(&self) -> Result<String, DappError> {
        Ok(self.session().connect()?.to_string())
    }

    /// Returns the connected wallet's address.
    pub fn handle_connect_callback(&self, url: String) -> Result<String, DappError> {
        let callback = parse_callback(&url)?;
        let wallet = self.session().complete_connect(&callback)?;
        Ok(bytes_to_address(&wallet))
    }

    pub fn disconnect(&self) -> Result<String, DappError> {
        Ok(self.session().disconnect()?.to_string())
    }

    pub fn handle_disconnect_callback(&self, url: String) -> Result<(), DappError> {
        let callback = parse_callback(&url)?;
        self.session().complete_disconnect(&callback)
    }

    /// The user came back without a callback. Frees the request slot.
    pub fn abandon_pending_request(&self) -> bool {
        self.session().abandon_pending()
    }

    /// Forget all session keys locally.
    pub fn reset_session(&self) {
        self.session().reset();
    }

    // ─── Transactions ────────────────────────────────────────────────

    /// Build the unsigned transfer and return the wallet sign link.
    pub async fn prepare_transfer(&self, params: TransferParams) -> Result<String, DappError> {
        let recipient = address_to_bytes(&params.recipient)?;
        let sender = self.session().require_wallet()?;
        let request = TransferRequest::new(sender, recipient, params.lamports)?;

        let balance = self.rpc.get_balance(&sender).await?;
        let rent_minimum = self.rpc.get_minimum_balance_for_rent_exemption(0).await?;
        let blockhash = self.rpc.get_latest_blockhash().await?;

        let (unsigned, kind) = match params.route {
            TransferRoute::System => {
                let unsigned =
                    build_transfer_transaction(&sender, &recipient, request.lamports, &blockhash)?;
                request.check_affordable(balance, unsigned.fee(), rent_minimum)?;
                (unsigned, TransactionKind::Transfer)
            }
            TransferRoute::Program { record_stats } => {
                let unsigned = build_program_transfer_transaction(
                    &sender,
                    &recipient,
                    request.lamports,
                    &blockhash,
                    record_stats,
                )?;
                request.check_affordable_via_program(balance, unsigned.fee(), rent_minimum)?;
                (unsigned, TransactionKind::ProgramCall)
            }
        };

        let url = self.session().request_signature(
            &unsigned,
            kind,
            request.lamports,
            params.wallet_broadcasts,
        )?;
        info!(
            recipient = %params.recipient,
            lamports = request.lamports,
            route = ?params.route,
            "transfer sent to wallet for signing"
        );
        Ok(url.to_string())
    }

    /// Sign link for the program's one-time `initialize`, with the connected
    /// wallet as authority.
    pub async fn prepare_initialize_program(&self) -> Result<String, DappError> {
        let authority = self.session().require_wallet()?;
        let blockhash = self.rpc.get_latest_blockhash().await?;
        let unsigned = build_initialize_transaction(&authority, &blockhash)?;
        let url = self
            .session()
            .request_signature(&unsigned, TransactionKind::ProgramCall, 0, false)?;
        Ok(url.to_string())
    }

    /// Decrypt the wallet's sign callback and, for signed bytes, broadcast
    /// and wait for the configured commitment.
    ///
    /// On `ConfirmationTimeout` the record stays `Pending`; call
    /// [`Self::refresh_status`] with the carried signature rather than
    /// preparing the transfer again.
    pub async fn handle_sign_callback(&self, url: String) -> Result<TransactionReceipt, DappError> {
        let callback = parse_callback(&url)?;
        let submission = self.session().complete_signature(&callback)?;

        match submission {
            SignedSubmission::Broadcast {
                transaction,
                signature,
                intent,
            } => {
                let options = self
                    .config
                    .broadcast_options(Some(intent.last_valid_block_height));
                match broadcast(self.rpc.as_ref(), &transaction, &options).await {
                    Ok(landed) => {
                        let status = status_for_commitment(self.config.commitment);
                        self.session().record(&landed, status);
                        Ok(TransactionReceipt {
                            signature: landed,
                            status,
                        })
                    }
                    Err(
                        e @ (SolError::BroadcastRejected(_)
                        | SolError::InvalidSignature(_)
                        | SolError::SerializationError(_)),
                    ) => {
                        self.session().record(&signature, TransactionStatus::Failed);
                        Err(e.into())
                    }
                    Err(e) => {
                        warn!(%signature, error = %e, "broadcast outcome unknown");
                        Err(e.into())
                    }
                }
            }
            SignedSubmission::AlreadySent { signature, .. } => {
                let status = self.refresh_status(signature.clone()).await?;
                Ok(TransactionReceipt { signature, status })
            }
        }
    }

    /// Re-query a signature and update its history entry.
    pub async fn refresh_status(&self, signature: String) -> Result<TransactionStatus, DappError> {
        let status = signature_status(self.rpc.as_ref(), &signature).await?;
        let mapped = status_from_network(status.as_ref());
        self.session().record(&signature, mapped);
        Ok(mapped)
    }

    // ─── Reads ───────────────────────────────────────────────────────

    /// Lamports held by `address`, or by the connected wallet if `None`.
    pub async fn get_balance(&self, address: Option<String>) -> Result<u64, DappError> {
        let target = match address {
            Some(address) => address_to_bytes(&address)?,
            None => self.session().require_wallet()?,
        };
        Ok(self.rpc.get_balance(&target).await?)
    }

    /// Faucet SOL for the connected wallet (devnet and testnet only).
    pub async fn request_airdrop(&self, lamports: u64) -> Result<String, DappError> {
        if !self.config.cluster.supports_airdrop() {
            return Err(DappError::AirdropUnavailable(format!(
                "{} has no faucet",
                self.config.cluster
            )));
        }
        if lamports == 0 {
            return Err(DappError::InvalidAmount("airdrop must request at least one lamport".into()));
        }
        let wallet = self.session().require_wallet()?;
        let signature = self.rpc.request_airdrop(&wallet, lamports).await?;
        self.session().history_mut().push(TransactionRecord::new(
            signature.clone(),
            TransactionKind::Airdrop,
            lamports,
        ));
        info!(%signature, lamports, "airdrop requested");
        Ok(signature)
    }

    /// `None` until the program has been initialized.
    pub async fn program_stats(&self) -> Result<Option<ProgramStats>, DappError> {
        let (address, _) = program_state_address()?;
        match self.rpc.get_account_info(&address).await? {
            Some(account) => Ok(Some(ProgramStateAccount::decode(&account.data)?.into())),
            None => Ok(None),
        }
    }

    // ─── History ─────────────────────────────────────────────────────

    pub fn history(&self, limit: u32) -> Vec<TransactionRecord> {
        self.session().history().recent(limit as usize)
    }

    pub fn export_history(&self) -> Result<String, DappError> {
        self.session().history().to_json()
    }

    pub fn import_history(&self, json: String) -> Result<(), DappError> {
        let history = TransactionHistory::from_json(&json, self.config.history_capacity)?;
        self.session().replace_history(history);
        Ok(())
    }
}
