use chain_sol::{bytes_to_address, Commitment, ProgramStateAccount, SignatureStatus};
use wallet_link::ConnectionState;

use crate::history::TransactionStatus;

/// Wallet pairing state as seen by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum ConnectionStatus {
    Disconnected,
    /// Connect link opened, waiting for the wallet's callback.
    Connecting,
    Connected,
}

impl From<ConnectionState> for ConnectionStatus {
    fn from(state: ConnectionState) -> Self {
        match state {
            ConnectionState::Disconnected => ConnectionStatus::Disconnected,
            ConnectionState::Connecting => ConnectionStatus::Connecting,
            ConnectionState::Connected => ConnectionStatus::Connected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum TransferRoute {
    /// Plain System Program transfer.
    System,
    /// Through the coin-transfer program's `transfer_sol`.
    Program { record_stats: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct TransferParams {
    /// Base58 recipient address.
    pub recipient: String,
    pub lamports: u64,
    pub route: TransferRoute,
    /// Use the deprecated sign-and-send wallet method.
    pub wallet_broadcasts: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct TransactionReceipt {
    pub signature: String,
    pub status: TransactionStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct ProgramStats {
    pub authority: String,
    pub total_transfers: u64,
    pub total_volume: u64,
    pub version: u8,
}

impl From<ProgramStateAccount> for ProgramStats {
    fn from(state: ProgramStateAccount) -> Self {
        Self {
            authority: bytes_to_address(&state.authority),
            total_transfers: state.total_transfers,
            total_volume: state.total_volume,
            version: state.version,
        }
    }
}

/// History status for a network status. `None` from the node means the
/// transaction is unknown there (not landed yet, or dropped).
pub fn status_from_network(status: Option<&SignatureStatus>) -> TransactionStatus {
    match status {
        None => TransactionStatus::Pending,
        Some(s) if s.err.is_some() => TransactionStatus::Failed,
        Some(s) => match s.confirmation_status {
            Some(Commitment::Finalized) => TransactionStatus::Finalized,
            Some(Commitment::Confirmed) => TransactionStatus::Confirmed,
            Some(Commitment::Processed) | None => TransactionStatus::Pending,
        },
    }
}

/// History status once a broadcast reached `commitment`.
pub fn status_for_commitment(commitment: Commitment) -> TransactionStatus {
    match commitment {
        Commitment::Finalized => TransactionStatus::Finalized,
        Commitment::Confirmed => TransactionStatus::Confirmed,
        // Processed is optimistic; the record stays open for a later refresh.
        Commitment::Processed => TransactionStatus::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(level: Option<Commitment>, err: Option<&str>) -> SignatureStatus {
        SignatureStatus {
            slot: 1,
            confirmation_status: level,
            err: err.map(String::from),
        }
    }

    #[test]
    fn network_status_mapping() {
        assert_eq!(status_from_network(None), TransactionStatus::Pending);
        assert_eq!(
            status_from_network(Some(&status(Some(Commitment::Confirmed), None))),
            TransactionStatus::Confirmed
        );
        assert_eq!(
            status_from_network(Some(&status(Some(Commitment::Finalized), None))),
            TransactionStatus::Finalized
        );
        assert_eq!(
            status_from_network(Some(&status(Some(Commitment::Finalized), Some("{\"InstructionError\":[0,1]}")))),
            TransactionStatus::Failed
        );
    }

    #[test]
    fn program_stats_renders_authority() {
        let stats: ProgramStats = ProgramStateAccount {
            authority: [0; 32],
            total_transfers: 3,
            total_volume: 42,
            version: 1,
            bump: 253,
        }
        .into();
        assert_eq!(stats.authority, "11111111111111111111111111111111");
        assert_eq!(stats.total_transfers, 3);
    }
}
