//! Solana support for the SOL transfer dApp.
//!
//! Addresses, PDA derivation, the legacy transaction wire format, the
//! `coin_transfer` program ABI, JSON-RPC access and the broadcaster. The wire
//! format is implemented by hand with `ed25519-dalek` and `bs58` rather than
//! pulling in `solana-sdk`.
//!
//! The dApp never holds the user's signing key: it assembles unsigned
//! transactions, hands their bytes to the external wallet, and broadcasts
//! whatever comes back only after verifying the signatures locally.

pub mod address;
pub mod broadcast;
pub mod cluster;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod local;
pub mod pda;
pub mod program;
pub mod rpc;
pub mod transaction;

pub use address::{
    address_to_bytes, bytes_to_address, signature_from_str, signature_to_string, validate_address,
};
pub use broadcast::{broadcast, signature_status, BroadcastOptions};
pub use cluster::{Cluster, Commitment, LAMPORTS_PER_SIGNATURE, LAMPORTS_PER_SOL};
pub use error::SolError;
#[cfg(any(test, feature = "test-utils"))]
pub use local::{rent_exempt_minimum, LocalCluster};
pub use pda::find_program_address;
pub use program::{
    build_initialize_transaction, build_program_transfer_transaction, program_state_address,
    ProgramStateAccount, COIN_TRANSFER_PROGRAM_ID,
};
pub use rpc::{AccountInfo, HttpRpcClient, SignatureStatus, SolanaRpc};
pub use transaction::{
    build_transfer_transaction, decode_transaction, public_key_from_private,
    sign_wire_transaction,
    DecodedTransaction, RecentBlockhash, SolTransaction, TransferRequest, UnsignedTransaction,
    SYSTEM_PROGRAM_ID,
};
