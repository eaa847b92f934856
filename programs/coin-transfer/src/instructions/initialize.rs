use anchor_lang::prelude::*;

use crate::error::TransferError;
use crate::events::ProgramInitialized;
use crate::state::ProgramState;

pub fn initialize(ctx: Context<Initialize>) -> Result<()> {
    let state = &mut ctx.accounts.state;
    // `init_if_needed` hands back the existing account on a second call.
    require!(!state.is_initialized(), TransferError::AlreadyInitialized);

    let authority = ctx.accounts.authority.key();
    state.init(authority, ctx.bumps.state);

    msg!("Coin transfer program initialized, authority {}", authority);
    ProgramInitialized::emit_event(authority, state.version)
}

#[derive(Accounts)]
pub struct Initialize<'info> {
    #[account(
        init_if_needed,
        payer = authority,
        space = 8 + ProgramState::INIT_SPACE,
        seeds = [ProgramState::PREFIX_SEED],
        bump
    )]
    pub state: Account<'info, ProgramState>,

    #[account(mut)]
    pub authority: Signer<'info>,

    pub system_program: Program<'info, System>,
}
