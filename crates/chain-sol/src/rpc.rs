//! Solana JSON-RPC access.
//!
//! [`SolanaRpc`] is the seam between transaction logic and the network. The
//! production implementation is [`HttpRpcClient`]; tests use the in-memory
//! `LocalCluster`.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

use crate::address::{address_to_bytes, bytes_to_address};
use crate::cluster::Commitment;
use crate::error::SolError;
use crate::transaction::RecentBlockhash;

// ---------------------------------------------------------------------------
// RPC types
// ---------------------------------------------------------------------------

/// An on-chain account as returned by `getAccountInfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub lamports: u64,
    pub owner: [u8; 32],
    pub data: Vec<u8>,
    pub executable: bool,
}

/// One entry of `getSignatureStatuses`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureStatus {
    pub slot: u64,
    pub confirmation_status: Option<Commitment>,
    /// On-chain execution error, rendered as JSON text.
    pub err: Option<String>,
}

impl SignatureStatus {
    /// Whether the transaction reached at least `commitment`.
    pub fn satisfies(&self, commitment: Commitment) -> bool {
        self.confirmation_status
            .map(|level| level >= commitment)
            .unwrap_or(false)
    }
}

#[async_trait]
pub trait SolanaRpc: Send + Sync {
    async fn get_balance(&self, address: &[u8; 32]) -> Result<u64, SolError>;

    async fn get_latest_blockhash(&self) -> Result<RecentBlockhash, SolError>;

    async fn get_block_height(&self) -> Result<u64, SolError>;

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64, SolError>;

    /// `Ok(None)` when the account does not exist.
    async fn get_account_info(&self, address: &[u8; 32]) -> Result<Option<AccountInfo>, SolError>;

    /// Submit signed wire bytes. Returns the transaction signature.
    async fn send_transaction(&self, wire: &[u8]) -> Result<String, SolError>;

    async fn get_signature_statuses(
        &self,
        signatures: &[String],
    ) -> Result<Vec<Option<SignatureStatus>>, SolError>;

    async fn request_airdrop(&self, address: &[u8; 32], lamports: u64) -> Result<String, SolError>;
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// JSON-RPC 2.0 client over HTTPS.
pub struct HttpRpcClient {
    url: Url,
    commitment: Commitment,
    client: reqwest::Client,
    next_id: AtomicU64,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockhashValue {
    blockhash: String,
    last_valid_block_height: u64,
}

#[derive(Deserialize)]
struct RawAccount {
    lamports: u64,
    owner: String,
    data: (String, String),
    executable: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStatus {
    slot: u64,
    err: Option<Value>,
    confirmation_status: Option<Commitment>,
}

impl HttpRpcClient {
    pub fn new(url: &str, commitment: Commitment) -> Result<Self, SolError> {
        let url = Url::parse(url)
            .map_err(|e| SolError::Transport(format!("invalid rpc url {url}: {e}")))?;
        Ok(Self {
            url,
            commitment,
            client: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, SolError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(method, id, "rpc request");

        let response = self
            .client
            .post(self.url.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| SolError::Transport(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!(method, "rpc rate limited");
            return Err(SolError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(SolError::Transport(format!(
                "{method}: http status {}",
                response.status()
            )));
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| SolError::Transport(format!("{method}: invalid response body: {e}")))?;

        if let Some(error) = body.error {
            return Err(SolError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        let result = body
            .result
            .ok_or_else(|| SolError::Transport(format!("{method}: missing result")))?;

        serde_json::from_value(result)
            .map_err(|e| SolError::SerializationError(format!("{method}: {e}")))
    }

    fn commitment_config(&self) -> Value {
        json!({ "commitment": self.commitment.as_str() })
    }
}

#[async_trait]
impl SolanaRpc for HttpRpcClient {
    async fn get_balance(&self, address: &[u8; 32]) -> Result<u64, SolError> {
        let res: WithContext<u64> = self
            .call(
                "getBalance",
                json!([bytes_to_address(address), self.commitment_config()]),
            )
            .await?;
        Ok(res.value)
    }

    async fn get_latest_blockhash(&self) -> Result<RecentBlockhash, SolError> {
        let res: WithContext<BlockhashValue> = self
            .call("getLatestBlockhash", json!([self.commitment_config()]))
            .await?;
        Ok(RecentBlockhash {
            blockhash: address_to_bytes(&res.value.blockhash)?,
            last_valid_block_height: res.value.last_valid_block_height,
        })
    }

    async fn get_block_height(&self) -> Result<u64, SolError> {
        self.call("getBlockHeight", json!([self.commitment_config()]))
            .await
    }

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64, SolError> {
        self.call("getMinimumBalanceForRentExemption", json!([data_len]))
            .await
    }

    async fn get_account_info(&self, address: &[u8; 32]) -> Result<Option<AccountInfo>, SolError> {
        let res: WithContext<Option<RawAccount>> = self
            .call(
                "getAccountInfo",
                json!([
                    bytes_to_address(address),
                    { "encoding": "base64", "commitment": self.commitment.as_str() }
                ]),
            )
            .await?;

        res.value
            .map(|raw| {
                let data = BASE64
                    .decode(&raw.data.0)
                    .map_err(|e| SolError::SerializationError(format!("account data: {e}")))?;
                Ok(AccountInfo {
                    lamports: raw.lamports,
                    owner: address_to_bytes(&raw.owner)?,
                    data,
                    executable: raw.executable,
                })
            })
            .transpose()
    }

    async fn send_transaction(&self, wire: &[u8]) -> Result<String, SolError> {
        self.call(
            "sendTransaction",
            json!([
                BASE64.encode(wire),
                {
                    "encoding": "base64",
                    "skipPreflight": false,
                    "preflightCommitment": self.commitment.as_str(),
                }
            ]),
        )
        .await
    }

    async fn get_signature_statuses(
        &self,
        signatures: &[String],
    ) -> Result<Vec<Option<SignatureStatus>>, SolError> {
        let res: WithContext<Vec<Option<RawStatus>>> = self
            .call(
                "getSignatureStatuses",
                json!([signatures, { "searchTransactionHistory": true }]),
            )
            .await?;

        Ok(res
            .value
            .into_iter()
            .map(|s| {
                s.map(|raw| SignatureStatus {
                    slot: raw.slot,
                    confirmation_status: raw.confirmation_status,
                    err: raw.err.map(|e| e.to_string()),
                })
            })
            .collect())
    }

    async fn request_airdrop(&self, address: &[u8; 32], lamports: u64) -> Result<String, SolError> {
        self.call(
            "requestAirdrop",
            json!([bytes_to_address(address), lamports, self.commitment_config()]),
        )
        .await
    }
}
