//! Solana legacy transaction wire format: assembly, decoding and signing.
//!
//! Transactions are built by hand, without `solana-sdk`. Layout:
//!
//! ```text
//! Transaction:
//!   num_signatures          compact-u16
//!   signatures              64 bytes * num_signatures
//!   message:
//!     num_required_sigs     u8
//!     num_readonly_signed   u8
//!     num_readonly_unsigned u8
//!     num_accounts          compact-u16
//!     account_keys          32 bytes * num_accounts
//!     recent_blockhash      32 bytes
//!     num_instructions      compact-u16
//!     instructions[]        (see below)
//!
//! Instruction:
//!   program_id_index        u8
//!   num_accounts            compact-u16
//!   account_indices         u8 * num_accounts
//!   data_len                compact-u16
//!   data                    u8 * data_len
//! ```
//!
//! The dApp never holds the user's key. It assembles an [`UnsignedTransaction`]
//! whose wire bytes carry zeroed signature slots, the external wallet fills
//! them in, and [`decode_transaction`] checks the result before broadcast.

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use tracing::debug;
use zeroize::Zeroize;

use crate::address::{bytes_to_address, signature_to_string};
use crate::cluster::LAMPORTS_PER_SIGNATURE;
use crate::error::SolError;

// ---------------------------------------------------------------------------
// Solana System Program
// ---------------------------------------------------------------------------

/// The System Program public key: 32 zero bytes.
/// Base58: `11111111111111111111111111111111`
pub const SYSTEM_PROGRAM_ID: [u8; 32] = [0u8; 32];

/// System Program `Transfer` instruction index (little-endian u32).
const SYSTEM_TRANSFER_IX_INDEX: u32 = 2;

const SIGNATURE_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Compact-u16 encoding
// ---------------------------------------------------------------------------

/// Encode a `u16` in Solana's compact-u16 format (1 to 3 bytes, 7 bits each).
pub fn encode_compact_u16(value: u16) -> Vec<u8> {
    let mut val = value as u32;
    let mut out = Vec::with_capacity(3);

    loop {
        let mut byte = (val & 0x7f) as u8;
        val >>= 7;
        if val > 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if val == 0 {
            break;
        }
    }

    out
}

/// Decode a compact-u16 from the front of `data`.
///
/// Returns `(value, bytes_consumed)`.
pub fn decode_compact_u16(data: &[u8]) -> Result<(u16, usize), SolError> {
    let mut value: u32 = 0;
    let mut consumed = 0usize;

    loop {
        let byte = *data.get(consumed).ok_or_else(|| {
            SolError::SerializationError("unexpected end of data while decoding compact-u16".into())
        })?;
        value |= ((byte & 0x7f) as u32) << (7 * consumed);
        consumed += 1;

        if byte & 0x80 == 0 || consumed >= 3 {
            break;
        }
    }

    let value = u16::try_from(value)
        .map_err(|_| SolError::SerializationError("compact-u16 value overflow".into()))?;
    Ok((value, consumed))
}

fn compact_len(len: usize, what: &str) -> Result<Vec<u8>, SolError> {
    let len = u16::try_from(len)
        .map_err(|_| SolError::SerializationError(format!("too many {what}: {len}")))?;
    Ok(encode_compact_u16(len))
}

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// A single account reference in an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolAccountMeta {
    pub pubkey: [u8; 32],
    pub is_signer: bool,
    pub is_writable: bool,
}

impl SolAccountMeta {
    pub fn writable(pubkey: [u8; 32], is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    pub fn readonly(pubkey: [u8; 32], is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

/// An instruction before it is compiled into a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolInstruction {
    pub program_id: [u8; 32],
    pub accounts: Vec<SolAccountMeta>,
    pub data: Vec<u8>,
}

/// A compiled legacy message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolTransaction {
    /// All account keys, in canonical order:
    ///   1. writable signers (fee payer first)
    ///   2. read-only signers
    ///   3. writable non-signers
    ///   4. read-only non-signers
    pub account_keys: Vec<[u8; 32]>,

    pub num_required_signatures: u8,
    pub num_readonly_signed: u8,
    pub num_readonly_unsigned: u8,

    pub recent_blockhash: [u8; 32],

    pub compiled_instructions: Vec<CompiledInstruction>,
}

/// An instruction whose accounts are u8 indices into `account_keys`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub account_indices: Vec<u8>,
    pub data: Vec<u8>,
}

impl SolTransaction {
    /// The fee payer is always the first account key.
    pub fn fee_payer(&self) -> Option<&[u8; 32]> {
        self.account_keys.first()
    }

    /// Keys that must sign, in signature-slot order.
    pub fn signers(&self) -> &[[u8; 32]] {
        let n = (self.num_required_signatures as usize).min(self.account_keys.len());
        &self.account_keys[..n]
    }

    /// Base fee: 5000 lamports per required signature.
    pub fn fee(&self) -> u64 {
        self.num_required_signatures as u64 * LAMPORTS_PER_SIGNATURE
    }

    /// Whether the account at `index` may be written by this message.
    pub fn is_writable(&self, index: usize) -> bool {
        let total = self.account_keys.len();
        let signers = self.num_required_signatures as usize;
        if index >= total {
            return false;
        }
        if index < signers {
            index < signers.saturating_sub(self.num_readonly_signed as usize)
        } else {
            index < total.saturating_sub(self.num_readonly_unsigned as usize)
        }
    }
}

/// A blockhash together with the last block height at which a transaction
/// stamped with it can still land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecentBlockhash {
    pub blockhash: [u8; 32],
    pub last_valid_block_height: u64,
}

// ---------------------------------------------------------------------------
// Transfer requests
// ---------------------------------------------------------------------------

/// A native SOL transfer the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub sender: [u8; 32],
    pub recipient: [u8; 32],
    pub lamports: u64,
}

impl TransferRequest {
    pub fn new(sender: [u8; 32], recipient: [u8; 32], lamports: u64) -> Result<Self, SolError> {
        if lamports == 0 {
            return Err(SolError::InvalidAmount);
        }
        if sender == recipient {
            return Err(SolError::InvalidRecipient);
        }
        Ok(Self {
            sender,
            recipient,
            lamports,
        })
    }

    /// Pre-flight check: the sender must keep `fee + rent_minimum` after the
    /// transfer. An overflowing total counts as unaffordable.
    pub fn check_affordable(&self, balance: u64, fee: u64, rent_minimum: u64) -> Result<(), SolError> {
        let required = self
            .lamports
            .checked_add(fee)
            .and_then(|v| v.checked_add(rent_minimum));

        match required {
            Some(required) if balance >= required => Ok(()),
            Some(required) => Err(SolError::InsufficientFunds { balance, required }),
            None => Err(SolError::InsufficientFunds {
                balance,
                required: u64::MAX,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Unsigned transactions
// ---------------------------------------------------------------------------

/// A compiled message stamped with a blockhash, waiting for the wallet to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub message: SolTransaction,
    pub last_valid_block_height: u64,
}

impl UnsignedTransaction {
    pub fn message_bytes(&self) -> Result<Vec<u8>, SolError> {
        serialize_message(&self.message)
    }

    /// Wire bytes with one zeroed 64-byte slot per required signature.
    pub fn wire_bytes(&self) -> Result<Vec<u8>, SolError> {
        let message = self.message_bytes()?;
        let slots = self.message.num_required_signatures as usize;

        let mut wire = Vec::with_capacity(3 + slots * SIGNATURE_LEN + message.len());
        wire.extend_from_slice(&encode_compact_u16(slots as u16));
        wire.resize(wire.len() + slots * SIGNATURE_LEN, 0);
        wire.extend_from_slice(&message);
        Ok(wire)
    }

    pub fn fee(&self) -> u64 {
        self.message.fee()
    }
}

/// Build an unsigned native SOL transfer: one System `Transfer` instruction,
/// `sender` pays the fee.
pub fn build_transfer_transaction(
    sender: &[u8; 32],
    recipient: &[u8; 32],
    lamports: u64,
    blockhash: &RecentBlockhash,
) -> Result<UnsignedTransaction, SolError> {
    let request = TransferRequest::new(*sender, *recipient, lamports)?;
    let instruction =
        build_system_transfer_instruction(&request.sender, &request.recipient, request.lamports);
    let message = compile_transaction(&[instruction], sender, &blockhash.blockhash)?;

    debug!(
        sender = %bytes_to_address(sender),
        recipient = %bytes_to_address(recipient),
        lamports,
        "built transfer transaction"
    );

    Ok(UnsignedTransaction {
        message,
        last_valid_block_height: blockhash.last_valid_block_height,
    })
}

/// Compile instructions into a message with a single fee payer at index 0.
pub fn compile_transaction(
    instructions: &[SolInstruction],
    fee_payer: &[u8; 32],
    recent_blockhash: &[u8; 32],
) -> Result<SolTransaction, SolError> {
    struct AccountEntry {
        pubkey: [u8; 32],
        is_signer: bool,
        is_writable: bool,
    }

    let mut entries: Vec<AccountEntry> = Vec::new();

    let mut upsert = |pubkey: [u8; 32], signer: bool, writable: bool| {
        if let Some(entry) = entries.iter_mut().find(|e| e.pubkey == pubkey) {
            entry.is_signer |= signer;
            entry.is_writable |= writable;
        } else {
            entries.push(AccountEntry {
                pubkey,
                is_signer: signer,
                is_writable: writable,
            });
        }
    };

    upsert(*fee_payer, true, true);
    for ix in instructions {
        for meta in &ix.accounts {
            upsert(meta.pubkey, meta.is_signer, meta.is_writable);
        }
        upsert(ix.program_id, false, false);
    }

    // Stable sort keeps insertion order within a category, so the fee payer
    // stays first among writable signers.
    entries.sort_by_key(|e| match (e.is_signer, e.is_writable) {
        (true, true) => 0u8,
        (true, false) => 1,
        (false, true) => 2,
        (false, false) => 3,
    });

    if entries.len() > 256 {
        return Err(SolError::TransactionBuildError(format!(
            "too many accounts: {}",
            entries.len()
        )));
    }

    let count = |what: &str, f: fn(&AccountEntry) -> bool| {
        let n = entries.iter().filter(|e| f(e)).count();
        u8::try_from(n)
            .map_err(|_| SolError::TransactionBuildError(format!("too many {what} accounts: {n}")))
    };
    let num_required_signatures = count("signer", |e| e.is_signer)?;
    let num_readonly_signed = count("readonly signer", |e| e.is_signer && !e.is_writable)?;
    let num_readonly_unsigned = count("readonly", |e| !e.is_signer && !e.is_writable)?;

    let account_keys: Vec<[u8; 32]> = entries.iter().map(|e| e.pubkey).collect();
    let index_of = |key: &[u8; 32], what: &str| {
        account_keys
            .iter()
            .position(|k| k == key)
            .map(|i| i as u8)
            .ok_or_else(|| SolError::TransactionBuildError(format!("{what} not in account keys")))
    };

    let mut compiled = Vec::with_capacity(instructions.len());
    for ix in instructions {
        let program_id_index = index_of(&ix.program_id, "program_id")?;
        let account_indices = ix
            .accounts
            .iter()
            .map(|meta| index_of(&meta.pubkey, "account"))
            .collect::<Result<Vec<u8>, _>>()?;

        compiled.push(CompiledInstruction {
            program_id_index,
            account_indices,
            data: ix.data.clone(),
        });
    }

    Ok(SolTransaction {
        account_keys,
        num_required_signatures,
        num_readonly_signed,
        num_readonly_unsigned,
        recent_blockhash: *recent_blockhash,
        compiled_instructions: compiled,
    })
}

/// Serialize the message: the bytes every signer signs.
pub fn serialize_message(tx: &SolTransaction) -> Result<Vec<u8>, SolError> {
    let mut buf = Vec::with_capacity(256);

    buf.push(tx.num_required_signatures);
    buf.push(tx.num_readonly_signed);
    buf.push(tx.num_readonly_unsigned);

    buf.extend_from_slice(&compact_len(tx.account_keys.len(), "account keys")?);
    for key in &tx.account_keys {
        buf.extend_from_slice(key);
    }

    buf.extend_from_slice(&tx.recent_blockhash);

    buf.extend_from_slice(&compact_len(tx.compiled_instructions.len(), "instructions")?);
    for ix in &tx.compiled_instructions {
        buf.push(ix.program_id_index);
        buf.extend_from_slice(&compact_len(ix.account_indices.len(), "instruction accounts")?);
        buf.extend_from_slice(&ix.account_indices);
        buf.extend_from_slice(&compact_len(ix.data.len(), "instruction data bytes")?);
        buf.extend_from_slice(&ix.data);
    }

    Ok(buf)
}

// ---------------------------------------------------------------------------
// Decoding signed transactions
// ---------------------------------------------------------------------------

/// A wire transaction split into its signatures and parsed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTransaction {
    pub signatures: Vec<[u8; 64]>,
    pub message: SolTransaction,
    /// The exact message bytes from the wire, as signed.
    pub message_bytes: Vec<u8>,
}

impl DecodedTransaction {
    /// The fee payer's signature, which is also the transaction id.
    pub fn signature(&self) -> Result<String, SolError> {
        self.signatures
            .first()
            .map(signature_to_string)
            .ok_or_else(|| SolError::InvalidSignature("transaction carries no signatures".into()))
    }

    /// Verify every required signature against the message bytes.
    pub fn verify_signatures(&self) -> Result<(), SolError> {
        let signers = self.message.signers();
        if self.signatures.len() != signers.len() {
            return Err(SolError::InvalidSignature(format!(
                "expected {} signatures, got {}",
                signers.len(),
                self.signatures.len()
            )));
        }

        for (i, (sig, key)) in self.signatures.iter().zip(signers).enumerate() {
            if sig.iter().all(|b| *b == 0) {
                return Err(SolError::InvalidSignature(format!(
                    "signature slot {i} is empty"
                )));
            }
            let verifying_key = VerifyingKey::from_bytes(key).map_err(|e| {
                SolError::InvalidSignature(format!("signer {i} is not a valid public key: {e}"))
            })?;
            verifying_key
                .verify_strict(&self.message_bytes, &Signature::from_bytes(sig))
                .map_err(|_| {
                    SolError::InvalidSignature(format!(
                        "signature {i} does not match signer {}",
                        bytes_to_address(key)
                    ))
                })?;
        }

        Ok(())
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8], SolError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| SolError::SerializationError(format!("transaction truncated in {what}")))?;
        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn u8(&mut self, what: &str) -> Result<u8, SolError> {
        Ok(self.take(1, what)?[0])
    }

    fn compact_u16(&mut self) -> Result<usize, SolError> {
        let (value, used) = decode_compact_u16(&self.data[self.pos..])?;
        self.pos += used;
        Ok(value as usize)
    }

    fn key(&mut self, what: &str) -> Result<[u8; 32], SolError> {
        let mut key = [0u8; 32];
        key.copy_from_slice(self.take(32, what)?);
        Ok(key)
    }
}

fn parse_message(bytes: &[u8]) -> Result<SolTransaction, SolError> {
    let mut r = Reader { data: bytes, pos: 0 };

    let num_required_signatures = r.u8("header")?;
    if num_required_signatures & 0x80 != 0 {
        return Err(SolError::SerializationError(
            "versioned messages are not supported".into(),
        ));
    }
    let num_readonly_signed = r.u8("header")?;
    let num_readonly_unsigned = r.u8("header")?;

    let num_accounts = r.compact_u16()?;
    let account_keys = (0..num_accounts)
        .map(|_| r.key("account keys"))
        .collect::<Result<Vec<_>, _>>()?;
    let recent_blockhash = r.key("blockhash")?;

    let num_instructions = r.compact_u16()?;
    let mut compiled_instructions = Vec::with_capacity(num_instructions);
    for _ in 0..num_instructions {
        let program_id_index = r.u8("instruction")?;
        let n = r.compact_u16()?;
        let account_indices = r.take(n, "instruction accounts")?.to_vec();
        let n = r.compact_u16()?;
        let data = r.take(n, "instruction data")?.to_vec();

        let out_of_range = std::iter::once(&program_id_index)
            .chain(&account_indices)
            .any(|i| *i as usize >= account_keys.len());
        if out_of_range {
            return Err(SolError::SerializationError(
                "instruction references an account index out of range".into(),
            ));
        }

        compiled_instructions.push(CompiledInstruction {
            program_id_index,
            account_indices,
            data,
        });
    }

    if r.pos != bytes.len() {
        return Err(SolError::SerializationError(format!(
            "{} trailing bytes after message",
            bytes.len() - r.pos
        )));
    }
    if num_required_signatures as usize > account_keys.len() {
        return Err(SolError::SerializationError(
            "more required signatures than accounts".into(),
        ));
    }

    Ok(SolTransaction {
        account_keys,
        num_required_signatures,
        num_readonly_signed,
        num_readonly_unsigned,
        recent_blockhash,
        compiled_instructions,
    })
}

/// Parse a legacy wire transaction. Signatures are not checked here; see
/// [`DecodedTransaction::verify_signatures`].
pub fn decode_transaction(wire: &[u8]) -> Result<DecodedTransaction, SolError> {
    let mut r = Reader { data: wire, pos: 0 };

    let num_sigs = r.compact_u16()?;
    if num_sigs == 0 {
        return Err(SolError::SerializationError(
            "transaction has zero signatures".into(),
        ));
    }
    let signatures = (0..num_sigs)
        .map(|_| {
            let mut sig = [0u8; SIGNATURE_LEN];
            sig.copy_from_slice(r.take(SIGNATURE_LEN, "signatures")?);
            Ok(sig)
        })
        .collect::<Result<Vec<_>, SolError>>()?;

    let message_bytes = wire[r.pos..].to_vec();
    let message = parse_message(&message_bytes)?;

    if message.num_required_signatures as usize != signatures.len() {
        return Err(SolError::SerializationError(format!(
            "header requires {} signatures, wire carries {}",
            message.num_required_signatures,
            signatures.len()
        )));
    }

    Ok(DecodedTransaction {
        signatures,
        message,
        message_bytes,
    })
}

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

fn signing_key(private_key: &[u8; 32]) -> SigningKey {
    let mut seed = *private_key;
    let key = SigningKey::from_bytes(&seed);
    seed.zeroize();
    key
}

/// Public key (address bytes) for an ed25519 seed.
pub fn public_key_from_private(private_key: &[u8; 32]) -> [u8; 32] {
    signing_key(private_key).verifying_key().to_bytes()
}

/// Fill this key's signature slot in an existing wire transaction. This is
/// what a wallet does with the bytes of an [`UnsignedTransaction`].
pub fn sign_wire_transaction(private_key: &[u8; 32], wire: &[u8]) -> Result<Vec<u8>, SolError> {
    let key = signing_key(private_key);
    let our_pubkey = key.verifying_key().to_bytes();
    let decoded = decode_transaction(wire)?;

    let slot = decoded
        .message
        .signers()
        .iter()
        .position(|k| *k == our_pubkey)
        .ok_or_else(|| {
            SolError::InvalidSignature("key not found in transaction signers".into())
        })?;

    let signature = key.sign(&decoded.message_bytes);
    let sigs_start = wire.len() - decoded.message_bytes.len() - decoded.signatures.len() * SIGNATURE_LEN;
    let offset = sigs_start + slot * SIGNATURE_LEN;

    let mut signed = wire.to_vec();
    signed[offset..offset + SIGNATURE_LEN].copy_from_slice(&signature.to_bytes());
    Ok(signed)
}

// ---------------------------------------------------------------------------
// System Program instructions
// ---------------------------------------------------------------------------

/// Build a System Program `Transfer` instruction.
pub fn build_system_transfer_instruction(from: &[u8; 32], to: &[u8; 32], lamports: u64) -> SolInstruction {
    // u32 LE instruction index (2 = Transfer) + u64 LE lamports.
    let mut data = Vec::with_capacity(12);
    data.extend_from_slice(&SYSTEM_TRANSFER_IX_INDEX.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());

    SolInstruction {
        program_id: SYSTEM_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta::writable(*from, true),
            SolAccountMeta::writable(*to, false),
        ],
        data,
    }
}

/// Parse System `Transfer` instruction data back into lamports.
pub fn parse_system_transfer_data(data: &[u8]) -> Option<u64> {
    if data.len() != 12 || data[..4] != SYSTEM_TRANSFER_IX_INDEX.to_le_bytes() {
        return None;
    }
    let mut amount = [0u8; 8];
    amount.copy_from_slice(&data[4..]);
    Some(u64::from_le_bytes(amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blockhash() -> RecentBlockhash {
        RecentBlockhash {
            blockhash: [0xCC; 32],
            last_valid_block_height: 1_150,
        }
    }

    fn keypair(seed: u8) -> ([u8; 32], [u8; 32]) {
        let private = [seed; 32];
        let public = SigningKey::from_bytes(&private).verifying_key().to_bytes();
        (private, public)
    }

    /// Single-signer wire bytes signed straight from the message.
    fn sign_transaction(tx: &SolTransaction, private_key: &[u8; 32]) -> Result<Vec<u8>, SolError> {
        let message_bytes = serialize_message(tx)?;
        let signature = signing_key(private_key).sign(&message_bytes);

        let mut wire = encode_compact_u16(1);
        wire.extend_from_slice(&signature.to_bytes());
        wire.extend_from_slice(&message_bytes);
        Ok(wire)
    }

    // -- compact-u16 --------------------------------------------------------

    #[test]
    fn compact_u16_boundaries() {
        assert_eq!(encode_compact_u16(0), vec![0x00]);
        assert_eq!(encode_compact_u16(0x7f), vec![0x7f]);
        assert_eq!(encode_compact_u16(128), vec![0x80, 0x01]);
        assert_eq!(encode_compact_u16(16383), vec![0xff, 0x7f]);
        assert_eq!(encode_compact_u16(16384), vec![0x80, 0x80, 0x01]);
        assert_eq!(encode_compact_u16(u16::MAX), vec![0xff, 0xff, 0x03]);
    }

    #[test]
    fn decode_compact_u16_values() {
        assert_eq!(decode_compact_u16(&[0x00]).unwrap(), (0, 1));
        assert_eq!(decode_compact_u16(&[0x80, 0x01]).unwrap(), (128, 2));
        assert_eq!(decode_compact_u16(&[0xff, 0xff, 0x03]).unwrap(), (u16::MAX, 3));
    }

    #[test]
    fn decode_compact_u16_overflow_and_truncation() {
        assert!(decode_compact_u16(&[]).is_err());
        assert!(decode_compact_u16(&[0x80]).is_err());
        assert!(decode_compact_u16(&[0xff, 0xff, 0x7f]).is_err());
    }

    // -- transfer requests ---------------------------------------------------

    #[test]
    fn zero_lamport_request_rejected() {
        assert!(matches!(
            TransferRequest::new([1; 32], [2; 32], 0),
            Err(SolError::InvalidAmount)
        ));
    }

    #[test]
    fn self_transfer_request_rejected() {
        assert!(matches!(
            TransferRequest::new([1; 32], [1; 32], 10),
            Err(SolError::InvalidRecipient)
        ));
    }

    #[test]
    fn affordability_includes_fee_and_rent() {
        let req = TransferRequest::new([1; 32], [2; 32], 1_000_000).unwrap();
        assert!(req.check_affordable(1_895_880, 5_000, 890_880).is_ok());

        match req.check_affordable(1_895_879, 5_000, 890_880) {
            Err(SolError::InsufficientFunds { balance, required }) => {
                assert_eq!(balance, 1_895_879);
                assert_eq!(required, 1_895_880);
            }
            other => panic!("expected InsufficientFunds, got {other:?}"),
        }
    }

    #[test]
    fn affordability_overflow_is_insufficient() {
        let req = TransferRequest::new([1; 32], [2; 32], u64::MAX).unwrap();
        assert!(matches!(
            req.check_affordable(u64::MAX, 5_000, 0),
            Err(SolError::InsufficientFunds { required: u64::MAX, .. })
        ));
    }

    // -- assembly -----------------------------------------------------------

    #[test]
    fn transfer_instruction_data() {
        let ix = build_system_transfer_instruction(&[1u8; 32], &[2u8; 32], 1_000_000);
        assert_eq!(ix.data.len(), 12);
        assert_eq!(&ix.data[..4], &[2, 0, 0, 0]);
        assert_eq!(parse_system_transfer_data(&ix.data), Some(1_000_000));
        assert_eq!(ix.program_id, SYSTEM_PROGRAM_ID);
    }

    #[test]
    fn transfer_transaction_layout() {
        let sender = [0xAAu8; 32];
        let recipient = [0xBBu8; 32];
        let tx = build_transfer_transaction(&sender, &recipient, 500_000_000, &blockhash()).unwrap();

        assert_eq!(tx.message.account_keys, vec![sender, recipient, SYSTEM_PROGRAM_ID]);
        assert_eq!(tx.message.num_required_signatures, 1);
        assert_eq!(tx.message.num_readonly_signed, 0);
        assert_eq!(tx.message.num_readonly_unsigned, 1);
        assert_eq!(tx.message.recent_blockhash, [0xCC; 32]);
        assert_eq!(tx.last_valid_block_height, 1_150);
        assert_eq!(tx.fee(), 5_000);

        let ix = &tx.message.compiled_instructions[0];
        assert_eq!(ix.program_id_index, 2);
        assert_eq!(ix.account_indices, vec![0, 1]);
    }

    #[test]
    fn writable_flags_follow_header() {
        let tx = build_transfer_transaction(&[1; 32], &[2; 32], 1, &blockhash()).unwrap();
        assert!(tx.message.is_writable(0));
        assert!(tx.message.is_writable(1));
        assert!(!tx.message.is_writable(2));
        assert!(!tx.message.is_writable(3));
    }

    #[test]
    fn unsigned_wire_has_empty_signature_slot() {
        let tx = build_transfer_transaction(&[1; 32], &[2; 32], 10, &blockhash()).unwrap();
        let wire = tx.wire_bytes().unwrap();
        let message = tx.message_bytes().unwrap();

        assert_eq!(wire[0], 1);
        assert!(wire[1..65].iter().all(|b| *b == 0));
        assert_eq!(&wire[65..], &message[..]);
    }

    #[test]
    fn serialize_message_header_and_blockhash() {
        let tx = build_transfer_transaction(&[1; 32], &[2; 32], 10, &blockhash()).unwrap();
        let bytes = serialize_message(&tx.message).unwrap();
        assert_eq!(&bytes[..4], &[1, 0, 1, 3]);
        let bh_start = 4 + 3 * 32;
        assert_eq!(&bytes[bh_start..bh_start + 32], &[0xCC; 32]);
    }

    #[test]
    fn signer_count_past_u8_is_rejected() {
        let key = |i: u16| {
            let mut k = [0u8; 32];
            k[..2].copy_from_slice(&i.to_le_bytes());
            k[31] = 1;
            k
        };
        // 256 keys in total, every one of them a signer.
        let program_id = key(255);
        let accounts: Vec<SolAccountMeta> =
            (1..=255).map(|i| SolAccountMeta::writable(key(i), true)).collect();
        let ix = SolInstruction {
            program_id,
            accounts,
            data: vec![],
        };

        match compile_transaction(&[ix], &key(0), &[0xCC; 32]) {
            Err(SolError::TransactionBuildError(msg)) => assert!(msg.contains("signer")),
            other => panic!("expected TransactionBuildError, got {other:?}"),
        }
    }

    // -- decode / sign / verify ---------------------------------------------

    #[test]
    fn decode_unsigned_roundtrip() {
        let tx = build_transfer_transaction(&[1; 32], &[2; 32], 42, &blockhash()).unwrap();
        let decoded = decode_transaction(&tx.wire_bytes().unwrap()).unwrap();
        assert_eq!(decoded.message, tx.message);
        assert_eq!(decoded.signatures, vec![[0u8; 64]]);
    }

    #[test]
    fn unsigned_transaction_fails_verification() {
        let tx = build_transfer_transaction(&[1; 32], &[2; 32], 42, &blockhash()).unwrap();
        let decoded = decode_transaction(&tx.wire_bytes().unwrap()).unwrap();
        match decoded.verify_signatures() {
            Err(SolError::InvalidSignature(msg)) => assert!(msg.contains("empty")),
            other => panic!("expected InvalidSignature, got {other:?}"),
        }
    }

    #[test]
    fn wallet_signature_verifies() {
        let (private, sender) = keypair(7);
        let tx = build_transfer_transaction(&sender, &[2; 32], 42, &blockhash()).unwrap();
        let signed = sign_wire_transaction(&private, &tx.wire_bytes().unwrap()).unwrap();

        let decoded = decode_transaction(&signed).unwrap();
        decoded.verify_signatures().unwrap();
        assert_eq!(
            decoded.signature().unwrap(),
            signature_to_string(&decoded.signatures[0])
        );
    }

    #[test]
    fn wire_signing_matches_direct_signing() {
        let (private, sender) = keypair(9);
        let tx = build_transfer_transaction(&sender, &[2; 32], 42, &blockhash()).unwrap();
        let via_wire = sign_wire_transaction(&private, &tx.wire_bytes().unwrap()).unwrap();
        let direct = sign_transaction(&tx.message, &private).unwrap();
        assert_eq!(via_wire, direct);
    }

    #[test]
    fn tampered_message_fails_verification() {
        let (private, sender) = keypair(7);
        let tx = build_transfer_transaction(&sender, &[2; 32], 42, &blockhash()).unwrap();
        let mut signed = sign_transaction(&tx.message, &private).unwrap();
        // Bump the lamport amount in the last instruction byte region.
        let last = signed.len() - 8;
        signed[last] ^= 0x01;

        let decoded = decode_transaction(&signed).unwrap();
        assert!(matches!(
            decoded.verify_signatures(),
            Err(SolError::InvalidSignature(_))
        ));
    }

    #[test]
    fn signing_with_foreign_key_fails() {
        let (other_private, _) = keypair(3);
        let tx = build_transfer_transaction(&[1; 32], &[2; 32], 42, &blockhash()).unwrap();
        assert!(matches!(
            sign_wire_transaction(&other_private, &tx.wire_bytes().unwrap()),
            Err(SolError::InvalidSignature(_))
        ));
    }

    #[test]
    fn decode_rejects_malformed_input() {
        assert!(decode_transaction(&[]).is_err());
        assert!(decode_transaction(&[0x00]).is_err());
        assert!(decode_transaction(&[0x01, 0xAA]).is_err());

        let tx = build_transfer_transaction(&[1; 32], &[2; 32], 42, &blockhash()).unwrap();
        let mut wire = tx.wire_bytes().unwrap();
        wire.push(0);
        match decode_transaction(&wire) {
            Err(SolError::SerializationError(msg)) => assert!(msg.contains("trailing")),
            other => panic!("expected trailing-bytes error, got {other:?}"),
        }
    }

    #[test]
    fn decode_rejects_versioned_message() {
        let tx = build_transfer_transaction(&[1; 32], &[2; 32], 42, &blockhash()).unwrap();
        let mut wire = tx.wire_bytes().unwrap();
        wire[65] = 0x80;
        assert!(decode_transaction(&wire).is_err());
    }
}
