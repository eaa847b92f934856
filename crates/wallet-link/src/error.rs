use std::fmt;

use session_crypto::CryptoError;
use thiserror::Error;

use crate::requests::RequestKind;

/// Deep-link protocol errors.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("wallet rejected the request: {0}")]
    Rejected(WalletRejection),

    #[error("callback is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("malformed wallet payload: {0}")]
    MalformedPayload(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("a {0} request is already waiting for the wallet")]
    RequestPending(RequestKind),

    #[error("unexpected {0} callback: no matching request is pending")]
    UnexpectedCallback(RequestKind),

    #[error("already connected to a wallet; disconnect first")]
    AlreadyConnected,
}

/// Error reported by the wallet through `errorCode` / `errorMessage`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletRejection {
    pub code: i64,
    pub message: String,
}

/// Classification of the wallet's numeric error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    UserRejected,
    Unauthorized,
    Disconnected,
    InvalidInput,
    ResourceUnavailable,
    TransactionRejected,
    MethodNotFound,
    Internal,
    Unknown,
}

impl WalletRejection {
    pub fn kind(&self) -> RejectionKind {
        match self.code {
            4001 => RejectionKind::UserRejected,
            4100 => RejectionKind::Unauthorized,
            4900 => RejectionKind::Disconnected,
            -32000 => RejectionKind::InvalidInput,
            -32002 => RejectionKind::ResourceUnavailable,
            -32003 => RejectionKind::TransactionRejected,
            -32601 => RejectionKind::MethodNotFound,
            -32603 => RejectionKind::Internal,
            _ => RejectionKind::Unknown,
        }
    }

    /// The user tapped "cancel". Not an error worth surfacing loudly.
    pub fn is_user_rejection(&self) -> bool {
        self.kind() == RejectionKind::UserRejected
    }
}

impl fmt::Display for WalletRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejection(code: i64) -> WalletRejection {
        WalletRejection {
            code,
            message: "x".into(),
        }
    }

    #[test]
    fn classifies_wallet_codes() {
        assert_eq!(rejection(4001).kind(), RejectionKind::UserRejected);
        assert_eq!(rejection(4100).kind(), RejectionKind::Unauthorized);
        assert_eq!(rejection(4900).kind(), RejectionKind::Disconnected);
        assert_eq!(rejection(-32000).kind(), RejectionKind::InvalidInput);
        assert_eq!(rejection(-32002).kind(), RejectionKind::ResourceUnavailable);
        assert_eq!(rejection(-32003).kind(), RejectionKind::TransactionRejected);
        assert_eq!(rejection(-32601).kind(), RejectionKind::MethodNotFound);
        assert_eq!(rejection(-32603).kind(), RejectionKind::Internal);
        assert_eq!(rejection(12).kind(), RejectionKind::Unknown);
        assert!(rejection(4001).is_user_rejection());
    }

    #[test]
    fn display_rejected() {
        let err = LinkError::Rejected(WalletRejection {
            code: 4001,
            message: "User rejected the request.".into(),
        });
        assert_eq!(
            err.to_string(),
            "wallet rejected the request: User rejected the request. (4001)"
        );
    }

    #[test]
    fn display_missing_field() {
        let err = LinkError::MissingField("nonce");
        assert_eq!(err.to_string(), "callback is missing required field `nonce`");
    }

    #[test]
    fn crypto_errors_pass_through() {
        let err: LinkError = CryptoError::NoActiveSession.into();
        assert_eq!(
            err.to_string(),
            "no active session: shared secret has not been derived"
        );
    }

    #[test]
    fn display_request_pending() {
        let err = LinkError::RequestPending(RequestKind::SignTransaction);
        assert_eq!(
            err.to_string(),
            "a signTransaction request is already waiting for the wallet"
        );
    }
}
