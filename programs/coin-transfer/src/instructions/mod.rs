pub mod get_balance;
pub mod initialize;
pub mod transfer_sol;

pub use get_balance::*;
pub use initialize::*;
pub use transfer_sol::*;
