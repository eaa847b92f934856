//! Client-local transaction history: a capped ring buffer, most recent first.
//!
//! The host persists it as JSON between launches via [`TransactionHistory::to_json`]
//! and [`TransactionHistory::from_json`].

use std::collections::VecDeque;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::DappError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
pub enum TransactionKind {
    Transfer,
    Airdrop,
    ProgramCall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Finalized,
    Failed,
}

impl TransactionStatus {
    pub fn is_final(&self) -> bool {
        matches!(self, TransactionStatus::Finalized | TransactionStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct TransactionRecord {
    pub signature: String,
    pub kind: TransactionKind,
    /// Lamports.
    pub amount: u64,
    pub status: TransactionStatus,
    /// Unix seconds.
    pub timestamp: i64,
}

impl TransactionRecord {
    pub fn new(signature: String, kind: TransactionKind, amount: u64) -> Self {
        Self {
            signature,
            kind,
            amount,
            status: TransactionStatus::Pending,
            timestamp: Utc::now().timestamp(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransactionHistory {
    capacity: usize,
    records: VecDeque<TransactionRecord>,
}

impl TransactionHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: VecDeque::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Add a record at the front, evicting the oldest when full. A record
    /// whose signature is already present replaces the old entry.
    pub fn push(&mut self, record: TransactionRecord) {
        self.records.retain(|r| r.signature != record.signature);
        self.records.push_front(record);
        self.records.truncate(self.capacity);
    }

    /// Update a record's status. Returns false if the signature is unknown.
    /// A final status is never overwritten.
    pub fn update_status(&mut self, signature: &str, status: TransactionStatus) -> bool {
        match self.records.iter_mut().find(|r| r.signature == signature) {
            Some(record) => {
                if !record.status.is_final() {
                    record.status = status;
                }
                true
            }
            None => false,
        }
    }

    pub fn get(&self, signature: &str) -> Option<&TransactionRecord> {
        self.records.iter().find(|r| r.signature == signature)
    }

    /// At most `limit` records, most recent first.
    pub fn recent(&self, limit: usize) -> Vec<TransactionRecord> {
        self.records.iter().take(limit).cloned().collect()
    }

    pub fn records(&self) -> Vec<TransactionRecord> {
        self.records.iter().cloned().collect()
    }

    pub fn to_json(&self) -> Result<String, DappError> {
        Ok(serde_json::to_string(&self.records)?)
    }

    /// Restore from [`Self::to_json`] output. Keeps the newest `capacity`
    /// entries if the export was larger.
    pub fn from_json(json: &str, capacity: usize) -> Result<Self, DappError> {
        let mut records: VecDeque<TransactionRecord> = serde_json::from_str(json)?;
        let capacity = capacity.max(1);
        records.truncate(capacity);
        Ok(Self { capacity, records })
    }
}
