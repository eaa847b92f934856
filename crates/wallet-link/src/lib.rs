//! # wallet-link
//!
//! Encrypted deep-link pairing with a mobile wallet app. The dApp never
//! holds the user's signing key: it opens wallet URLs carrying sealed
//! payloads and reads sealed answers from the redirect callbacks.

pub mod error;
pub mod pairing;
pub mod requests;
pub mod responses;
#[cfg(any(test, feature = "test-utils"))]
pub mod simulator;

pub use error::{LinkError, RejectionKind, WalletRejection};
pub use pairing::{ConnectionState, PairingProtocol};
pub use requests::{
    build_connect_request, build_disconnect_request, build_sign_and_send_request,
    build_sign_request, AppMetadata, RequestKind,
};
pub use responses::{
    parse_connect_response, parse_disconnect_response, parse_sign_response, ConnectedWallet,
    SignResponse,
};
#[cfg(any(test, feature = "test-utils"))]
pub use simulator::WalletSimulator;

/// Universal-link base of the Phantom wallet.
pub const PHANTOM_BASE_URL: &str = "https://phantom.app/ul/v1";
