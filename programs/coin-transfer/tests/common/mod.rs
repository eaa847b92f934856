use anchor_lang::InstructionData;
use coin_transfer::error::TransferError;
use litesvm::types::TransactionResult;
use litesvm::LiteSVM;
use solana_sdk::{
    instruction::{AccountMeta, Instruction, InstructionError},
    pubkey::Pubkey,
    signature::Keypair,
    signer::Signer,
    system_program,
    transaction::{Transaction, TransactionError},
};

pub const FEE: u64 = 5_000;
pub const RENT_ZERO_DATA: u64 = 890_880;

pub struct TestContext {
    pub svm: LiteSVM,
    pub program_id: Pubkey,
    pub state: Pubkey,
}

/// Build with `cargo build-sbf` (or `anchor build`) first.
fn program_path() -> String {
    format!("{}/../../target/deploy/coin_transfer.so", env!("CARGO_MANIFEST_DIR"))
}

pub fn setup_test() -> TestContext {
    let mut svm = LiteSVM::new();
    let program_id = Pubkey::new_from_array(coin_transfer::ID.to_bytes());
    svm.add_program_from_file(program_id, program_path())
        .expect("Failed to load program");
    let (state, _) = Pubkey::find_program_address(&[b"program_state"], &program_id);

    TestContext {
        svm,
        program_id,
        state,
    }
}

impl TestContext {
    pub fn funded(&mut self, lamports: u64) -> Keypair {
        let keypair = Keypair::new();
        self.svm
            .airdrop(&keypair.pubkey(), lamports)
            .expect("Failed to airdrop");
        keypair
    }

    pub fn balance(&self, key: &Pubkey) -> u64 {
        self.svm.get_balance(key).unwrap_or(0)
    }

    /// Sign and send with a fresh blockhash so identical instructions are
    /// not rejected as duplicates.
    pub fn send(&mut self, ix: Instruction, payer: &Keypair, signers: &[&Keypair]) -> TransactionResult {
        self.svm.expire_blockhash();
        let mut all: Vec<&Keypair> = vec![payer];
        all.extend_from_slice(signers);
        let tx = Transaction::new_signed_with_payer(
            &[ix],
            Some(&payer.pubkey()),
            all.as_slice(),
            self.svm.latest_blockhash(),
        );
        self.svm.send_transaction(tx)
    }

    pub fn initialize_ix(&self, authority: &Pubkey) -> Instruction {
        Instruction {
            program_id: self.program_id,
            accounts: vec![
                AccountMeta::new(self.state, false),
                AccountMeta::new(*authority, true),
                AccountMeta::new_readonly(system_program::id(), false),
            ],
            data: coin_transfer::instruction::Initialize {}.data(),
        }
    }

    /// `sender_signs = false` leaves the sender out of the signer set.
    pub fn transfer_ix(
        &self,
        sender: &Pubkey,
        recipient: &Pubkey,
        amount: u64,
        with_state: bool,
        sender_signs: bool,
    ) -> Instruction {
        let state = if with_state {
            AccountMeta::new(self.state, false)
        } else {
            // Anchor reads the program id in an optional slot as `None`.
            AccountMeta::new_readonly(self.program_id, false)
        };
        Instruction {
            program_id: self.program_id,
            accounts: vec![
                AccountMeta::new(*sender, sender_signs),
                AccountMeta::new(*recipient, false),
                state,
                AccountMeta::new_readonly(system_program::id(), false),
            ],
            data: coin_transfer::instruction::TransferSol { amount }.data(),
        }
    }

    pub fn get_balance_ix(&self, account: &Pubkey) -> Instruction {
        Instruction {
            program_id: self.program_id,
            accounts: vec![AccountMeta::new_readonly(*account, false)],
            data: coin_transfer::instruction::GetBalance {}.data(),
        }
    }

    /// `(authority, total_transfers, total_volume, version)` of the state PDA.
    pub fn state(&self) -> Option<([u8; 32], u64, u64, u8)> {
        let account = self.svm.get_account(&self.state)?;
        let data = account.data;
        let mut authority = [0u8; 32];
        authority.copy_from_slice(&data[8..40]);
        let total_transfers = u64::from_le_bytes(data[40..48].try_into().ok()?);
        let total_volume = u64::from_le_bytes(data[48..56].try_into().ok()?);
        Some((authority, total_transfers, total_volume, data[56]))
    }
}

/// Custom error code of a failed single-instruction transaction.
pub fn program_error(result: TransactionResult) -> u32 {
    match result {
        Err(failed) => match failed.err {
            TransactionError::InstructionError(0, InstructionError::Custom(code)) => code,
            other => panic!("expected a program error, got {other:?}"),
        },
        Ok(_) => panic!("expected the transaction to fail"),
    }
}

pub fn code(err: TransferError) -> u32 {
    err.into()
}
