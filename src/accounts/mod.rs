//! On-chain account layouts and address derivation for the Pump.fun program
//!
//! - `GlobalAccount`: program-wide fee and reserve configuration.
//! - `BondingCurveAccount`: per-token reserve state.
//! - PDA helpers for every program-owned account a buy touches.

mod bonding_curve;
mod global;

pub use bonding_curve::*;
pub use global::*;

use crate::constants::{accounts::PUMPFUN, seeds};
use solana_sdk::pubkey::Pubkey;

/// PDA of the program's global account
pub fn get_global_pda() -> Pubkey {
    Pubkey::find_program_address(&[seeds::GLOBAL_SEED], &PUMPFUN).0
}

/// PDA of a token's bonding curve account
pub fn get_bonding_curve_pda(mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[seeds::BONDING_CURVE_SEED, mint.as_ref()], &PUMPFUN).0
}

/// PDA of the vault collecting a creator's fees
pub fn get_creator_vault_pda(creator: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[seeds::CREATOR_VAULT_SEED, creator.as_ref()], &PUMPFUN).0
}

/// PDA of a user's volume accumulator; differs per wallet
pub fn get_user_volume_accumulator_pda(user: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[seeds::USER_VOLUME_ACCUMULATOR_SEED, user.as_ref()],
        &PUMPFUN,
    )
    .0
}
