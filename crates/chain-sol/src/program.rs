//! Client side of the `coin_transfer` on-chain program.
//!
//! Instruction data is the 8-byte Anchor discriminator
//! (`sha256("global:<name>")[..8]`) followed by Borsh-encoded arguments.
//! The singleton state account lives at the PDA of `[b"program_state"]`.

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::address::bytes_to_address;
use crate::error::SolError;
use crate::pda::find_program_address;
use crate::transaction::{
    compile_transaction, RecentBlockhash, SolAccountMeta, SolInstruction, TransferRequest,
    UnsignedTransaction, SYSTEM_PROGRAM_ID,
};

// ---------------------------------------------------------------------------
// Program constants
// ---------------------------------------------------------------------------

/// `HFE4phQSrBXbNakK2ddAcPGmo5Tm5C9z8difCcf4Cjgq`
pub const COIN_TRANSFER_PROGRAM_ID: [u8; 32] = [
    0xf1, 0x5f, 0xe5, 0x53, 0xee, 0x99, 0xaa, 0x5d, 0xc1, 0x0a, 0xee, 0xc8, 0x4c, 0xa5, 0xbe,
    0xe0, 0xd4, 0xc6, 0x72, 0x07, 0xa4, 0x43, 0xd4, 0x37, 0xf8, 0xe1, 0xc8, 0x79, 0x68, 0x90,
    0x63, 0xd6,
];

pub const PROGRAM_STATE_SEED: &[u8] = b"program_state";

/// `sha256("global:initialize")[..8]`
pub const INITIALIZE_DISCRIMINATOR: [u8; 8] = [0xaf, 0xaf, 0x6d, 0x1f, 0x0d, 0x98, 0x9b, 0xed];
/// `sha256("global:transfer_sol")[..8]`
pub const TRANSFER_SOL_DISCRIMINATOR: [u8; 8] = [0x4e, 0x0a, 0xec, 0xf7, 0x6d, 0x75, 0x15, 0x4c];
/// `sha256("global:get_balance")[..8]`
pub const GET_BALANCE_DISCRIMINATOR: [u8; 8] = [0x05, 0xad, 0xb4, 0x97, 0xf3, 0x51, 0xe9, 0x37];
/// `sha256("account:ProgramState")[..8]`
pub const PROGRAM_STATE_DISCRIMINATOR: [u8; 8] = [0x4d, 0xd1, 0x89, 0xe5, 0x95, 0x43, 0xa7, 0xe6];

/// Serialized size of the state account, discriminator included.
pub const PROGRAM_STATE_LEN: usize = 8 + 32 + 8 + 8 + 1 + 1 + 64;

/// Lamports `transfer_sol` requires on top of amount and rent. The program
/// checks the balance after the runtime has already taken the fee, so this
/// is charged in addition to it.
pub const TRANSFER_FEE_RESERVE: u64 = 5_000;

/// Anchor sighash for an instruction or account name in a namespace.
pub fn anchor_discriminator(namespace: &str, name: &str) -> [u8; 8] {
    let hash = Sha256::digest(format!("{namespace}:{name}").as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&hash[..8]);
    out
}

/// The state PDA and its canonical bump.
pub fn program_state_address() -> Result<([u8; 32], u8), SolError> {
    find_program_address(&[PROGRAM_STATE_SEED], &COIN_TRANSFER_PROGRAM_ID)
}

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

pub fn build_initialize_instruction(authority: &[u8; 32]) -> Result<SolInstruction, SolError> {
    let (state, _) = program_state_address()?;
    Ok(SolInstruction {
        program_id: COIN_TRANSFER_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta::writable(state, false),
            SolAccountMeta::writable(*authority, true),
            SolAccountMeta::readonly(SYSTEM_PROGRAM_ID, false),
        ],
        data: INITIALIZE_DISCRIMINATOR.to_vec(),
    })
}

/// `transfer_sol(amount)`. When `record_stats` is false the optional state
/// account slot carries the program id, which Anchor reads as `None`.
pub fn build_transfer_sol_instruction(
    sender: &[u8; 32],
    recipient: &[u8; 32],
    amount: u64,
    record_stats: bool,
) -> Result<SolInstruction, SolError> {
    let state = if record_stats {
        SolAccountMeta::writable(program_state_address()?.0, false)
    } else {
        SolAccountMeta::readonly(COIN_TRANSFER_PROGRAM_ID, false)
    };

    let mut data = Vec::with_capacity(16);
    data.extend_from_slice(&TRANSFER_SOL_DISCRIMINATOR);
    data.extend_from_slice(&amount.to_le_bytes());

    Ok(SolInstruction {
        program_id: COIN_TRANSFER_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta::writable(*sender, true),
            SolAccountMeta::writable(*recipient, false),
            state,
            SolAccountMeta::readonly(SYSTEM_PROGRAM_ID, false),
        ],
        data,
    })
}

pub fn build_get_balance_instruction(account: &[u8; 32]) -> SolInstruction {
    SolInstruction {
        program_id: COIN_TRANSFER_PROGRAM_ID,
        accounts: vec![SolAccountMeta::readonly(*account, false)],
        data: GET_BALANCE_DISCRIMINATOR.to_vec(),
    }
}

/// Decode the `get_balance` return data (u64 LE lamports).
pub fn parse_get_balance_return(data: &[u8]) -> Result<u64, SolError> {
    let bytes: [u8; 8] = data.try_into().map_err(|_| {
        SolError::SerializationError(format!("expected 8 bytes of return data, got {}", data.len()))
    })?;
    Ok(u64::from_le_bytes(bytes))
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// Unsigned transaction calling `transfer_sol` through the program.
pub fn build_program_transfer_transaction(
    sender: &[u8; 32],
    recipient: &[u8; 32],
    lamports: u64,
    blockhash: &RecentBlockhash,
    record_stats: bool,
) -> Result<UnsignedTransaction, SolError> {
    let request = TransferRequest::new(*sender, *recipient, lamports)?;
    let ix = build_transfer_sol_instruction(
        &request.sender,
        &request.recipient,
        request.lamports,
        record_stats,
    )?;
    let message = compile_transaction(&[ix], sender, &blockhash.blockhash)?;

    debug!(
        sender = %bytes_to_address(sender),
        lamports,
        record_stats,
        "built program transfer transaction"
    );

    Ok(UnsignedTransaction {
        message,
        last_valid_block_height: blockhash.last_valid_block_height,
    })
}

pub fn build_initialize_transaction(
    authority: &[u8; 32],
    blockhash: &RecentBlockhash,
) -> Result<UnsignedTransaction, SolError> {
    let ix = build_initialize_instruction(authority)?;
    let message = compile_transaction(&[ix], authority, &blockhash.blockhash)?;
    Ok(UnsignedTransaction {
        message,
        last_valid_block_height: blockhash.last_valid_block_height,
    })
}

impl TransferRequest {
    /// Pre-flight for the program route. Mirrors `transfer_sol`, which sees
    /// `balance - fee` and requires `amount + reserve + rent_minimum` of it.
    pub fn check_affordable_via_program(
        &self,
        balance: u64,
        fee: u64,
        rent_minimum: u64,
    ) -> Result<(), SolError> {
        let fee_and_reserve = fee.checked_add(TRANSFER_FEE_RESERVE).unwrap_or(u64::MAX);
        self.check_affordable(balance, fee_and_reserve, rent_minimum)
    }
}

// ---------------------------------------------------------------------------
// State account
// ---------------------------------------------------------------------------

/// Decoded `ProgramState` account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramStateAccount {
    pub authority: [u8; 32],
    pub total_transfers: u64,
    pub total_volume: u64,
    pub version: u8,
    pub bump: u8,
}

impl ProgramStateAccount {
    pub fn decode(data: &[u8]) -> Result<Self, SolError> {
        if data.len() < PROGRAM_STATE_LEN {
            return Err(SolError::SerializationError(format!(
                "program state too short: {} bytes",
                data.len()
            )));
        }
        if data[..8] != PROGRAM_STATE_DISCRIMINATOR {
            return Err(SolError::SerializationError(
                "account is not a ProgramState".into(),
            ));
        }

        let u64_at = |at: usize| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(&data[at..at + 8]);
            u64::from_le_bytes(buf)
        };
        let mut authority = [0u8; 32];
        authority.copy_from_slice(&data[8..40]);

        Ok(Self {
            authority,
            total_transfers: u64_at(40),
            total_volume: u64_at(48),
            version: data[56],
            bump: data[57],
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PROGRAM_STATE_LEN);
        out.extend_from_slice(&PROGRAM_STATE_DISCRIMINATOR);
        out.extend_from_slice(&self.authority);
        out.extend_from_slice(&self.total_transfers.to_le_bytes());
        out.extend_from_slice(&self.total_volume.to_le_bytes());
        out.push(self.version);
        out.push(self.bump);
        out.resize(PROGRAM_STATE_LEN, 0);
        out
    }
}
