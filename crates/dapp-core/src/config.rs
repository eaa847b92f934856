//! App configuration, supplied by the host as JSON.
//!
//! Every field has a default so the host only overrides what it needs:
//!
//! ```json
//! { "app_url": "https://coin-transfer.app", "cluster": "devnet" }
//! ```

use std::time::Duration;

use chain_sol::{BroadcastOptions, Cluster, Commitment};
use serde::{Deserialize, Serialize};
use wallet_link::{AppMetadata, PHANTOM_BASE_URL};

use crate::error::DappError;

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DappConfig {
    /// Shown by the wallet on the connect prompt.
    pub app_url: String,
    /// Deep link the wallet redirects back to.
    pub redirect_link: String,
    pub cluster: Cluster,
    /// Overrides the cluster's public endpoint.
    pub rpc_url: Option<String>,
    pub wallet_base_url: String,
    pub commitment: Commitment,
    pub confirmation_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub history_capacity: usize,
    /// How long a request may wait for its wallet callback before another
    /// request is allowed to replace it.
    pub pending_request_ttl_secs: u64,
}

impl Default for DappConfig {
    fn default() -> Self {
        Self {
            app_url: "https://coin-transfer.app".into(),
            redirect_link: "cointransfer://wallet-callback".into(),
            cluster: Cluster::Devnet,
            rpc_url: None,
            wallet_base_url: PHANTOM_BASE_URL.into(),
            commitment: Commitment::Confirmed,
            confirmation_timeout_secs: 60,
            poll_interval_ms: 500,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            pending_request_ttl_secs: 300,
        }
    }
}

impl DappConfig {
    pub fn from_json(json: &str) -> Result<Self, DappError> {
        let config: DappConfig = serde_json::from_str(json)
            .map_err(|e| DappError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DappError> {
        let urls = [
            ("app_url", self.app_url.as_str()),
            ("redirect_link", self.redirect_link.as_str()),
            ("wallet_base_url", self.wallet_base_url.as_str()),
        ];
        for (name, value) in urls {
            url::Url::parse(value)
                .map_err(|e| DappError::InvalidConfig(format!("{name} `{value}`: {e}")))?;
        }
        if let Some(rpc) = &self.rpc_url {
            url::Url::parse(rpc)
                .map_err(|e| DappError::InvalidConfig(format!("rpc_url `{rpc}`: {e}")))?;
        }
        if self.history_capacity == 0 {
            return Err(DappError::InvalidConfig("history_capacity must be at least 1".into()));
        }
        if self.confirmation_timeout_secs == 0 || self.poll_interval_ms == 0 {
            return Err(DappError::InvalidConfig(
                "confirmation timeout and poll interval must be non-zero".into(),
            ));
        }
        Ok(())
    }

    pub fn rpc_url(&self) -> &str {
        self.rpc_url
            .as_deref()
            .unwrap_or_else(|| self.cluster.default_rpc_url())
    }

    pub fn app_metadata(&self) -> AppMetadata {
        AppMetadata {
            app_url: self.app_url.clone(),
            redirect_link: self.redirect_link.clone(),
            cluster: self.cluster,
        }
    }

    pub fn pending_request_ttl(&self) -> Duration {
        Duration::from_secs(self.pending_request_ttl_secs)
    }

    pub fn broadcast_options(&self, last_valid_block_height: Option<u64>) -> BroadcastOptions {
        BroadcastOptions {
            commitment: self.commitment,
            timeout: Duration::from_secs(self.confirmation_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            last_valid_block_height,
        }
    }
}
