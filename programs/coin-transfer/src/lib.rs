//! SOL transfers between two accounts, with optional singleton statistics.

use anchor_lang::prelude::*;

pub mod constants;
pub mod error;
pub mod events;
pub mod instructions;
pub mod security;
pub mod state;

use instructions::*;

declare_id!("HFE4phQSrBXbNakK2ddAcPGmo5Tm5C9z8difCcf4Cjgq");

#[program]
pub mod coin_transfer {
    use super::*;

    /// Create the `ProgramState` PDA. Fails with `AlreadyInitialized` on a
    /// second call; the first call's values are kept.
    pub fn initialize(ctx: Context<Initialize>) -> Result<()> {
        instructions::initialize(ctx)
    }

    /// Move `amount` lamports from the signing sender to the recipient.
    ///
    /// The sender must keep the fee reserve and its rent-exempt minimum.
    pub fn transfer_sol(ctx: Context<TransferSol>, amount: u64) -> Result<()> {
        instructions::transfer_sol(ctx, amount)
    }

    /// Lamport balance of `account`, as return data.
    pub fn get_balance(ctx: Context<GetBalance>) -> Result<u64> {
        instructions::get_balance(ctx)
    }
}
