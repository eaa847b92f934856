pub const PROGRAM_STATE_SEED: &[u8] = b"program_state";

pub const PROGRAM_VERSION: u8 = 1;

/// Lamports kept back for the network fee when checking the sender's balance.
pub const FEE_RESERVE_LAMPORTS: u64 = 5_000;

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;
