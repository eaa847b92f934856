use chain_sol::SolError;
use session_crypto::CryptoError;
use thiserror::Error;
use wallet_link::LinkError;

#[derive(Debug, Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum DappError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient funds: balance {balance} lamports, required {required}")]
    InsufficientFunds { balance: u64, required: u64 },

    #[error("No wallet connected")]
    NotConnected,

    #[error("Wallet is already connected")]
    AlreadyConnected,

    #[error("Request pending: {0}")]
    RequestPending(String),

    #[error("Wallet rejected the request: {message} ({code})")]
    WalletRejected { code: i64, message: String },

    #[error("Wallet protocol error: {0}")]
    Protocol(String),

    #[error("Session encryption error: {0}")]
    Crypto(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Broadcast rejected: {0}")]
    BroadcastRejected(String),

    #[error("Confirmation timed out for {signature}")]
    ConfirmationTimeout { signature: String },

    #[error("Airdrop unavailable: {0}")]
    AirdropUnavailable(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SolError> for DappError {
    fn from(e: SolError) -> Self {
        match e {
            SolError::InvalidAddress(msg) => DappError::InvalidAddress(msg),
            SolError::InvalidAmount | SolError::InvalidRecipient => {
                DappError::InvalidAmount(e.to_string())
            }
            SolError::InsufficientFunds { balance, required } => {
                DappError::InsufficientFunds { balance, required }
            }
            SolError::BroadcastRejected(msg) => DappError::BroadcastRejected(msg),
            SolError::ConfirmationTimeout { signature } => {
                DappError::ConfirmationTimeout { signature }
            }
            SolError::InvalidSignature(_) | SolError::SerializationError(_) => {
                DappError::Protocol(format!("SOL: {e}"))
            }
            SolError::TransactionBuildError(msg) => DappError::Internal(msg),
            SolError::Transport(_)
            | SolError::Rpc { .. }
            | SolError::RateLimited
            | SolError::AccountNotFound(_) => DappError::Network(e.to_string()),
        }
    }
}

impl From<LinkError> for DappError {
    fn from(e: LinkError) -> Self {
        match e {
            LinkError::Crypto(inner) => inner.into(),
            LinkError::Rejected(r) => DappError::WalletRejected {
                code: r.code,
                message: r.message,
            },
            LinkError::RequestPending(kind) => DappError::RequestPending(kind.to_string()),
            LinkError::AlreadyConnected => DappError::AlreadyConnected,
            LinkError::InvalidUrl(msg) => DappError::InvalidConfig(msg),
            LinkError::MissingField(_)
            | LinkError::MalformedPayload(_)
            | LinkError::UnexpectedCallback(_) => DappError::Protocol(e.to_string()),
        }
    }
}

impl From<CryptoError> for DappError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::NoActiveSession | CryptoError::NoKeypair => DappError::NotConnected,
            other => DappError::Crypto(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for DappError {
    fn from(e: serde_json::Error) -> Self {
        DappError::Serialization(e.to_string())
    }
}
