use anchor_lang::error_code;

#[error_code]
pub enum TransferError {
    #[msg("Transfer amount must be greater than 0")]
    InvalidAmount,

    #[msg("Sender has insufficient funds for this transfer")]
    InsufficientFunds,

    #[msg("Program state is already initialized")]
    AlreadyInitialized,

    #[msg("Unauthorized: signer does not have permission")]
    Unauthorized,

    #[msg("Account not found")]
    AccountNotFound,

    #[msg("Invalid recipient address")]
    InvalidRecipient,
}
