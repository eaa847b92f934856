use anchor_lang::prelude::*;

use crate::constants::FEE_RESERVE_LAMPORTS;
use crate::error::TransferError;

// Checks shared by the instruction handlers. Kept free of account types so
// they run off-chain in unit tests.

pub mod validation {
    use super::*;

    pub fn validate_amount(amount: u64) -> Result<()> {
        require!(amount > 0, TransferError::InvalidAmount);
        Ok(())
    }

    pub fn validate_signer(is_signer: bool) -> Result<()> {
        require!(is_signer, TransferError::Unauthorized);
        Ok(())
    }

    pub fn validate_recipient(sender: &Pubkey, recipient: &Pubkey) -> Result<()> {
        require_keys_neq!(*sender, *recipient, TransferError::InvalidRecipient);
        Ok(())
    }

    /// Lamports the sender must hold for `amount` to go through while
    /// staying rent exempt. `None` on overflow.
    pub fn required_balance(amount: u64, rent_minimum: u64) -> Option<u64> {
        amount
            .checked_add(FEE_RESERVE_LAMPORTS)?
            .checked_add(rent_minimum)
    }

    pub fn validate_sufficient_funds(balance: u64, amount: u64, rent_minimum: u64) -> Result<()> {
        let required = required_balance(amount, rent_minimum).ok_or(TransferError::InsufficientFunds)?;
        require_gte!(balance, required, TransferError::InsufficientFunds);
        Ok(())
    }

    /// A key the runtime has never seen shows up with no lamports and no data.
    pub fn validate_account_exists(lamports: u64, data_len: usize) -> Result<()> {
        require!(lamports > 0 || data_len > 0, TransferError::AccountNotFound);
        Ok(())
    }
}
