//! Submitting wallet-signed transactions and waiting for them to land.
//!
//! A transaction is submitted exactly once. If the network response is lost
//! the signature is still known locally, so the outcome is resolved by
//! polling, never by re-sending.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cluster::Commitment;
use crate::error::SolError;
use crate::rpc::{SignatureStatus, SolanaRpc};
use crate::transaction::decode_transaction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastOptions {
    pub commitment: Commitment,
    /// Upper bound on the wait for `commitment`.
    pub timeout: Duration,
    pub poll_interval: Duration,
    /// Block height after which the transaction's blockhash has expired.
    pub last_valid_block_height: Option<u64>,
}

impl Default for BroadcastOptions {
    fn default() -> Self {
        Self {
            commitment: Commitment::Confirmed,
            timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(500),
            last_valid_block_height: None,
        }
    }
}

/// Verify, submit and confirm a signed wire transaction. Returns its
/// signature once it reaches `options.commitment`.
///
/// Errors:
/// - `InvalidSignature` / `SerializationError`: rejected locally, never sent.
/// - `BroadcastRejected`: the node refused it, it failed on chain, or its
///   blockhash expired before it landed.
/// - `ConfirmationTimeout`: outcome unknown. Query [`signature_status`] with
///   the carried signature instead of re-broadcasting.
pub async fn broadcast(
    rpc: &dyn SolanaRpc,
    signed: &[u8],
    options: &BroadcastOptions,
) -> Result<String, SolError> {
    let decoded = decode_transaction(signed)?;
    decoded.verify_signatures()?;
    let signature = decoded.signature()?;

    match rpc.send_transaction(signed).await {
        Ok(returned) if returned != signature => {
            warn!(%returned, expected = %signature, "node returned a different signature");
        }
        Ok(_) => {}
        Err(e) if e.is_retryable() => {
            // The node may still have received it. Fall through to polling.
            warn!(%signature, error = %e, "send outcome unknown, polling status");
        }
        Err(SolError::Rpc { code, message }) => {
            warn!(%signature, code, %message, "transaction rejected by node");
            return Err(SolError::BroadcastRejected(message));
        }
        Err(e) => return Err(SolError::BroadcastRejected(e.to_string())),
    }
    info!(%signature, commitment = options.commitment.as_str(), "transaction submitted");

    match tokio::time::timeout(options.timeout, poll_until_landed(rpc, &signature, options)).await {
        Ok(result) => result.map(|()| signature),
        Err(_) => {
            warn!(%signature, "confirmation timed out");
            Err(SolError::ConfirmationTimeout { signature })
        }
    }
}

async fn poll_until_landed(
    rpc: &dyn SolanaRpc,
    signature: &str,
    options: &BroadcastOptions,
) -> Result<(), SolError> {
    loop {
        match signature_status(rpc, signature).await {
            Ok(Some(status)) => {
                if let Some(err) = status.err {
                    warn!(%signature, %err, "transaction failed on chain");
                    return Err(SolError::BroadcastRejected(format!(
                        "transaction failed on chain: {err}"
                    )));
                }
                if status.satisfies(options.commitment) {
                    info!(%signature, slot = status.slot, "transaction confirmed");
                    return Ok(());
                }
                debug!(%signature, "landed, waiting for commitment");
            }
            Ok(None) => {
                if let Some(last_valid) = options.last_valid_block_height {
                    match rpc.get_block_height().await {
                        Ok(height) if height > last_valid => {
                            warn!(%signature, height, last_valid, "blockhash expired");
                            return Err(SolError::BroadcastRejected(format!(
                                "blockhash expired at block height {height} (last valid {last_valid})"
                            )));
                        }
                        Ok(_) => {}
                        Err(e) if e.is_retryable() => {}
                        Err(e) => return Err(e),
                    }
                }
            }
            Err(e) if e.is_retryable() => {
                debug!(%signature, error = %e, "status poll failed, retrying");
            }
            Err(e) => return Err(e),
        }

        tokio::time::sleep(options.poll_interval).await;
    }
}

/// Current status of a previously submitted transaction, `None` if the
/// cluster has no record of it.
pub async fn signature_status(
    rpc: &dyn SolanaRpc,
    signature: &str,
) -> Result<Option<SignatureStatus>, SolError> {
    let mut statuses = rpc.get_signature_statuses(&[signature.to_string()]).await?;
    Ok(statuses.pop().flatten())
}
