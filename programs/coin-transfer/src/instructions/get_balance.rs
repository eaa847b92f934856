use anchor_lang::prelude::*;

use crate::constants::LAMPORTS_PER_SOL;
use crate::security::validation;

/// Read-only; the balance is returned through the transaction return data.
pub fn get_balance(ctx: Context<GetBalance>) -> Result<u64> {
    let account = &ctx.accounts.account;
    let balance = account.lamports();
    validation::validate_account_exists(balance, account.data_len())?;

    msg!(
        "Balance of {}: {} lamports ({}.{:09} SOL)",
        account.key(),
        balance,
        balance / LAMPORTS_PER_SOL,
        balance % LAMPORTS_PER_SOL
    );
    Ok(balance)
}

#[derive(Accounts)]
pub struct GetBalance<'info> {
    /// CHECK: any account may be queried; only its lamports are read
    pub account: UncheckedAccount<'info>,
}
