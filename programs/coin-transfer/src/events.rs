use anchor_lang::prelude::*;

/// Emitted once by `initialize`.
#[event]
pub struct ProgramInitialized {
    pub authority: Pubkey,
    pub version: u8,
    pub timestamp: i64,
}

/// Emitted after every successful `transfer_sol`.
#[event]
pub struct SolTransferred {
    pub sender: Pubkey,
    pub recipient: Pubkey,
    pub amount: u64,
    /// `None` when the caller did not pass the state account.
    pub total_transfers: Option<u64>,
    pub timestamp: i64,
}

impl ProgramInitialized {
    pub fn emit_event(authority: Pubkey, version: u8) -> Result<()> {
        emit!(Self {
            authority,
            version,
            timestamp: Clock::get()?.unix_timestamp,
        });
        Ok(())
    }
}

impl SolTransferred {
    pub fn emit_event(
        sender: Pubkey,
        recipient: Pubkey,
        amount: u64,
        total_transfers: Option<u64>,
    ) -> Result<()> {
        emit!(Self {
            sender,
            recipient,
            amount,
            total_transfers,
            timestamp: Clock::get()?.unix_timestamp,
        });
        Ok(())
    }
}
