use thiserror::Error;

/// Solana transaction assembly, RPC and broadcast errors.
#[derive(Debug, Error)]
pub enum SolError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("invalid amount: transfer must move at least one lamport")]
    InvalidAmount,

    #[error("invalid recipient: sender and recipient are the same account")]
    InvalidRecipient,

    #[error("insufficient funds: balance {balance} lamports, required {required}")]
    InsufficientFunds { balance: u64, required: u64 },

    #[error("transaction build error: {0}")]
    TransactionBuildError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("rpc transport error: {0}")]
    Transport(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("rpc rate limited")]
    RateLimited,

    #[error("broadcast rejected: {0}")]
    BroadcastRejected(String),

    #[error("confirmation timed out for {signature}")]
    ConfirmationTimeout { signature: String },

    #[error("account not found: {0}")]
    AccountNotFound(String),
}

impl SolError {
    /// Whether a read may be retried by the caller. Broadcast outcomes are
    /// never retryable: the transaction may already have landed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SolError::Transport(_) | SolError::RateLimited)
    }
}
