use anchor_lang::prelude::*;

use crate::constants::{PROGRAM_STATE_SEED, PROGRAM_VERSION};

/// Singleton transfer statistics, stored at the PDA of `[b"program_state"]`.
#[account]
#[derive(Debug, InitSpace)]
pub struct ProgramState {
    pub authority: Pubkey,
    pub total_transfers: u64,
    /// Lamports moved through `transfer_sol`.
    pub total_volume: u64,
    pub version: u8,
    pub bump: u8,
    pub reserved: [u8; 64],
}

impl Default for ProgramState {
    fn default() -> Self {
        Self {
            authority: Pubkey::default(),
            total_transfers: 0,
            total_volume: 0,
            version: 0,
            bump: 0,
            reserved: [0; 64],
        }
    }
}

impl ProgramState {
    pub const PREFIX_SEED: &'static [u8] = PROGRAM_STATE_SEED;

    /// A freshly allocated account is all zeroes, so version 0 means unset.
    pub fn is_initialized(&self) -> bool {
        self.version != 0
    }

    pub fn init(&mut self, authority: Pubkey, bump: u8) {
        self.authority = authority;
        self.total_transfers = 0;
        self.total_volume = 0;
        self.version = PROGRAM_VERSION;
        self.bump = bump;
    }

    /// Bookkeeping only; saturates rather than failing the transfer.
    pub fn record_transfer(&mut self, amount: u64) {
        self.total_transfers = self.total_transfers.saturating_add(1);
        self.total_volume = self.total_volume.saturating_add(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_lang::Discriminator;

    #[test]
    fn account_size_matches_client_layout() {
        assert_eq!(8 + ProgramState::INIT_SPACE, 122);
    }

    #[test]
    fn discriminator_is_anchor_account_hash() {
        assert_eq!(
            ProgramState::DISCRIMINATOR,
            &[0x4d, 0xd1, 0x89, 0xe5, 0x95, 0x43, 0xa7, 0xe6]
        );
    }

    #[test]
    fn init_sets_version_and_resets_counters() {
        let mut state = ProgramState {
            total_transfers: 9,
            total_volume: 9,
            ..Default::default()
        };
        assert!(!state.is_initialized());

        let authority = Pubkey::new_unique();
        state.init(authority, 253);

        assert!(state.is_initialized());
        assert_eq!(state.authority, authority);
        assert_eq!(state.total_transfers, 0);
        assert_eq!(state.total_volume, 0);
        assert_eq!(state.version, 1);
        assert_eq!(state.bump, 253);
    }

    #[test]
    fn record_transfer_saturates() {
        let mut state = ProgramState::default();
        state.init(Pubkey::new_unique(), 255);
        state.record_transfer(500_000_000);
        state.record_transfer(250);
        assert_eq!(state.total_transfers, 2);
        assert_eq!(state.total_volume, 500_000_250);

        state.total_transfers = u64::MAX;
        state.total_volume = u64::MAX - 1;
        state.record_transfer(10);
        assert_eq!(state.total_transfers, u64::MAX);
        assert_eq!(state.total_volume, u64::MAX);
    }

    #[test]
    fn serialized_layout_matches_field_order() {
        let mut state = ProgramState::default();
        state.init(Pubkey::new_from_array([7; 32]), 253);
        state.record_transfer(42);

        let mut data = Vec::new();
        state.try_serialize(&mut data).unwrap();
        assert_eq!(data.len(), 122);
        assert_eq!(&data[8..40], &[7u8; 32]);
        assert_eq!(u64::from_le_bytes(data[40..48].try_into().unwrap()), 1);
        assert_eq!(u64::from_le_bytes(data[48..56].try_into().unwrap()), 42);
        assert_eq!(data[56], 1);
        assert_eq!(data[57], 253);
    }
}
