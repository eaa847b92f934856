use anchor_lang::prelude::*;
use anchor_lang::system_program;

use crate::constants::LAMPORTS_PER_SOL;
use crate::events::SolTransferred;
use crate::security::validation;
use crate::state::ProgramState;

pub fn transfer_sol(ctx: Context<TransferSol>, amount: u64) -> Result<()> {
    let sender = &ctx.accounts.sender;
    let recipient = &ctx.accounts.recipient;

    validation::validate_signer(sender.is_signer)?;
    validation::validate_amount(amount)?;
    validation::validate_recipient(sender.key, recipient.key)?;

    let rent_minimum = Rent::get()?.minimum_balance(sender.data_len());
    validation::validate_sufficient_funds(sender.lamports(), amount, rent_minimum)?;

    msg!(
        "Transfer {} lamports ({}.{:09} SOL) from {} to {}",
        amount,
        amount / LAMPORTS_PER_SOL,
        amount % LAMPORTS_PER_SOL,
        sender.key(),
        recipient.key()
    );

    let cpi_context = CpiContext::new(
        ctx.accounts.system_program.to_account_info(),
        system_program::Transfer {
            from: sender.to_account_info(),
            to: recipient.to_account_info(),
        },
    );
    system_program::transfer(cpi_context, amount)?;

    let total_transfers = match ctx.accounts.state.as_mut() {
        Some(state) => {
            state.record_transfer(amount);
            Some(state.total_transfers)
        }
        None => None,
    };

    SolTransferred::emit_event(sender.key(), recipient.key(), amount, total_transfers)
}

#[derive(Accounts)]
pub struct TransferSol<'info> {
    /// CHECK: signature is checked in the handler so a missing one maps to
    /// `Unauthorized`; the System Program enforces ownership on debit
    #[account(mut)]
    pub sender: UncheckedAccount<'info>,

    /// CHECK: only receives lamports
    #[account(mut)]
    pub recipient: UncheckedAccount<'info>,

    /// Pass to record the transfer in the program statistics.
    #[account(
        mut,
        seeds = [ProgramState::PREFIX_SEED],
        bump = state.bump
    )]
    pub state: Option<Account<'info, ProgramState>>,

    pub system_program: Program<'info, System>,
}
