//! In-memory cluster for tests.
//!
//! Charges 5000 lamports per signature, executes System `Transfer`
//! instructions, enforces blockhash validity, rent exemption and duplicate
//! rejection. Failing transactions are refused at preflight and leave every
//! balance untouched.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::address::signature_to_string;
use crate::cluster::Commitment;
use crate::error::SolError;
use crate::rpc::{AccountInfo, SignatureStatus, SolanaRpc};
use crate::transaction::{
    decode_transaction, parse_system_transfer_data, RecentBlockhash, SYSTEM_PROGRAM_ID,
};

/// Blocks a blockhash stays usable for.
pub const BLOCKHASH_VALIDITY: u64 = 150;

const GENESIS_BLOCK_HEIGHT: u64 = 1_000;

/// Rent-exempt minimum for an account holding `data_len` bytes.
pub fn rent_exempt_minimum(data_len: usize) -> u64 {
    // (128 bytes of account overhead + data) * 3480 lamports/byte-year * 2 years
    (128 + data_len as u64) * 3_480 * 2
}

struct State {
    accounts: HashMap<[u8; 32], AccountInfo>,
    block_height: u64,
    slot: u64,
    blockhashes: HashMap<[u8; 32], u64>,
    latest_blockhash: [u8; 32],
    statuses: HashMap<String, SignatureStatus>,
    landing_commitment: Option<Commitment>,
    sent: usize,
    airdrops: u64,
}

impl State {
    fn roll_blockhash(&mut self) {
        let hash: [u8; 32] = Sha256::digest(self.block_height.to_le_bytes()).into();
        self.latest_blockhash = hash;
        self.blockhashes
            .insert(hash, self.block_height + BLOCKHASH_VALIDITY);
    }

    fn lamports(&self, key: &[u8; 32]) -> u64 {
        self.accounts.get(key).map(|a| a.lamports).unwrap_or(0)
    }
}

fn simulation_failed(reason: impl std::fmt::Display) -> SolError {
    SolError::Rpc {
        code: -32002,
        message: format!("Transaction simulation failed: {reason}"),
    }
}

pub struct LocalCluster {
    state: Mutex<State>,
}

impl Default for LocalCluster {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalCluster {
    pub fn new() -> Self {
        let mut state = State {
            accounts: HashMap::new(),
            block_height: GENESIS_BLOCK_HEIGHT,
            slot: GENESIS_BLOCK_HEIGHT,
            blockhashes: HashMap::new(),
            latest_blockhash: [0u8; 32],
            statuses: HashMap::new(),
            landing_commitment: Some(Commitment::Finalized),
            sent: 0,
            airdrops: 0,
        };
        state.roll_blockhash();
        Self {
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Credit `lamports` to `address`, creating a system account if needed.
    pub fn fund(&self, address: &[u8; 32], lamports: u64) {
        let mut state = self.lock();
        let account = state.accounts.entry(*address).or_insert_with(|| AccountInfo {
            lamports: 0,
            owner: SYSTEM_PROGRAM_ID,
            data: Vec::new(),
            executable: false,
        });
        account.lamports = account.lamports.saturating_add(lamports);
    }

    /// Install an arbitrary account, e.g. a program state account.
    pub fn set_account(&self, address: &[u8; 32], account: AccountInfo) {
        self.lock().accounts.insert(*address, account);
    }

    pub fn balance(&self, address: &[u8; 32]) -> u64 {
        self.lock().lamports(address)
    }

    /// Produce `blocks` empty blocks. Old blockhashes expire accordingly.
    pub fn advance_blocks(&self, blocks: u64) {
        let mut state = self.lock();
        state.block_height += blocks;
        state.slot += blocks;
        state.roll_blockhash();
    }

    /// Commitment accepted transactions reach immediately. `None` makes
    /// accepted transactions silently drop, as an overloaded leader would.
    pub fn set_landing_commitment(&self, commitment: Option<Commitment>) {
        self.lock().landing_commitment = commitment;
    }

    /// Number of transactions accepted by `send_transaction`.
    pub fn sent_count(&self) -> usize {
        self.lock().sent
    }

    fn execute(state: &mut State, wire: &[u8]) -> Result<String, SolError> {
        let decoded = decode_transaction(wire)
            .map_err(|e| SolError::Rpc { code: -32602, message: e.to_string() })?;
        decoded.verify_signatures().map_err(|e| SolError::Rpc {
            code: -32003,
            message: format!("Transaction signature verification failure: {e}"),
        })?;
        let signature = decoded.signature()?;
        let message = &decoded.message;

        if state.statuses.contains_key(&signature) {
            return Err(simulation_failed("This transaction has already been processed"));
        }
        match state.blockhashes.get(&message.recent_blockhash) {
            Some(last_valid) if *last_valid >= state.block_height => {}
            _ => return Err(simulation_failed("Blockhash not found")),
        }

        let mut balances: HashMap<[u8; 32], u64> = message
            .account_keys
            .iter()
            .map(|k| (*k, state.lamports(k)))
            .collect();

        let payer = *message
            .fee_payer()
            .ok_or_else(|| simulation_failed("missing fee payer"))?;
        let fee = message.fee();
        let payer_balance = balances.get(&payer).copied().unwrap_or(0);
        if payer_balance < fee {
            return Err(simulation_failed(
                "Attempt to debit an account but found no record of a prior credit.",
            ));
        }
        balances.insert(payer, payer_balance - fee);

        for ix in &message.compiled_instructions {
            let program = message.account_keys[ix.program_id_index as usize];
            if program != SYSTEM_PROGRAM_ID {
                return Err(simulation_failed(format!(
                    "program {} is not deployed on this cluster",
                    crate::address::bytes_to_address(&program)
                )));
            }
            let lamports = parse_system_transfer_data(&ix.data)
                .ok_or_else(|| simulation_failed("unsupported system instruction"))?;
            let (from_idx, to_idx) = match ix.account_indices.as_slice() {
                [from, to] => (*from as usize, *to as usize),
                _ => return Err(simulation_failed("transfer expects two accounts")),
            };
            if from_idx >= message.num_required_signatures as usize {
                return Err(simulation_failed("transfer source did not sign"));
            }
            if !message.is_writable(from_idx) || !message.is_writable(to_idx) {
                return Err(simulation_failed("transfer account is read-only"));
            }

            let from = message.account_keys[from_idx];
            let to = message.account_keys[to_idx];
            let from_balance = balances.get(&from).copied().unwrap_or(0);
            if from_balance < lamports {
                return Err(simulation_failed(format!(
                    "Transfer: insufficient lamports {from_balance}, need {lamports}"
                )));
            }
            balances.insert(from, from_balance - lamports);
            let to_balance = balances.get(&to).copied().unwrap_or(0);
            let credited = to_balance
                .checked_add(lamports)
                .ok_or_else(|| simulation_failed("lamport overflow"))?;
            balances.insert(to, credited);
        }

        for (key, lamports) in &balances {
            let data_len = state.accounts.get(key).map(|a| a.data.len()).unwrap_or(0);
            if *lamports > 0 && *lamports < rent_exempt_minimum(data_len) {
                return Err(simulation_failed(format!(
                    "Transaction results in an account ({}) with insufficient funds for rent",
                    crate::address::bytes_to_address(key)
                )));
            }
        }

        state.sent += 1;
        let Some(commitment) = state.landing_commitment else {
            return Ok(signature);
        };

        for (key, lamports) in balances {
            let account = state.accounts.entry(key).or_insert_with(|| AccountInfo {
                lamports: 0,
                owner: SYSTEM_PROGRAM_ID,
                data: Vec::new(),
                executable: false,
            });
            account.lamports = lamports;
        }
        state.slot += 1;
        let slot = state.slot;
        state.statuses.insert(
            signature.clone(),
            SignatureStatus {
                slot,
                confirmation_status: Some(commitment),
                err: None,
            },
        );
        Ok(signature)
    }
}

#[async_trait]
impl SolanaRpc for LocalCluster {
    async fn get_balance(&self, address: &[u8; 32]) -> Result<u64, SolError> {
        Ok(self.balance(address))
    }

    async fn get_latest_blockhash(&self) -> Result<RecentBlockhash, SolError> {
        let state = self.lock();
        let last_valid_block_height = state
            .blockhashes
            .get(&state.latest_blockhash)
            .copied()
            .unwrap_or(state.block_height);
        Ok(RecentBlockhash {
            blockhash: state.latest_blockhash,
            last_valid_block_height,
        })
    }

    async fn get_block_height(&self) -> Result<u64, SolError> {
        Ok(self.lock().block_height)
    }

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> Result<u64, SolError> {
        Ok(rent_exempt_minimum(data_len))
    }

    async fn get_account_info(&self, address: &[u8; 32]) -> Result<Option<AccountInfo>, SolError> {
        Ok(self
            .lock()
            .accounts
            .get(address)
            .filter(|a| a.lamports > 0 || !a.data.is_empty())
            .cloned())
    }

    async fn send_transaction(&self, wire: &[u8]) -> Result<String, SolError> {
        let mut state = self.lock();
        Self::execute(&mut state, wire)
    }

    async fn get_signature_statuses(
        &self,
        signatures: &[String],
    ) -> Result<Vec<Option<SignatureStatus>>, SolError> {
        let state = self.lock();
        Ok(signatures
            .iter()
            .map(|s| state.statuses.get(s).cloned())
            .collect())
    }

    async fn request_airdrop(&self, address: &[u8; 32], lamports: u64) -> Result<String, SolError> {
        self.fund(address, lamports);

        let mut state = self.lock();
        state.airdrops += 1;
        let mut sig = [0u8; 64];
        sig[..32].copy_from_slice(&Sha256::digest(state.airdrops.to_le_bytes()));
        sig[32..].copy_from_slice(address);
        let signature = signature_to_string(&sig);

        state.slot += 1;
        let slot = state.slot;
        state.statuses.insert(
            signature.clone(),
            SignatureStatus {
                slot,
                confirmation_status: Some(Commitment::Finalized),
                err: None,
            },
        );
        Ok(signature)
    }
}
