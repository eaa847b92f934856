//! # dapp-core
//!
//! What the mobile app links against: one [`DappClient`] owning the wallet
//! session, the RPC connection and local history, exported through UniFFI.

pub mod client;
pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod session;
pub mod types;

pub use client::DappClient;
pub use config::DappConfig;
pub use error::DappError;
pub use history::{TransactionHistory, TransactionKind, TransactionRecord, TransactionStatus};
pub use logging::LogFormat;
pub use types::{ConnectionStatus, ProgramStats, TransactionReceipt, TransferParams, TransferRoute};

uniffi::setup_scaffolding!();

/// Install the log subscriber. Call once at app start.
#[uniffi::export]
pub fn setup_logging(level: String, format: LogFormat) -> Result<(), DappError> {
    logging::init_logging(&level, format)
}

/// Whether `address` is a valid base58 Solana address.
#[uniffi::export]
pub fn is_valid_address(address: String) -> bool {
    chain_sol::validate_address(&address).is_ok()
}

/// Whole-SOL amount (as typed by the user) to lamports.
#[uniffi::export]
pub fn sol_to_lamports(sol: f64) -> Result<u64, DappError> {
    if !sol.is_finite() || sol <= 0.0 {
        return Err(DappError::InvalidAmount(format!("{sol} SOL")));
    }
    let lamports = (sol * chain_sol::LAMPORTS_PER_SOL as f64).round();
    if lamports < 1.0 || lamports > u64::MAX as f64 {
        return Err(DappError::InvalidAmount(format!("{sol} SOL")));
    }
    Ok(lamports as u64)
}
