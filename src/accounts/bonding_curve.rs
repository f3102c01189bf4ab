//! Bonding curve account of a Pump.fun token
//!
//! The curve is a constant-product pool over virtual reserves. Only the buy
//! side is priced here; it is the estimate the batch buys are sized with.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::pubkey::Pubkey;

/// Reserve state of one token's bonding curve
#[derive(Debug, Clone, BorshSerialize, BorshDeserialize)]
pub struct BondingCurveAccount {
    pub discriminator: u64,
    pub virtual_token_reserves: u64,
    pub virtual_sol_reserves: u64,
    pub real_token_reserves: u64,
    pub real_sol_reserves: u64,
    pub token_total_supply: u64,
    /// Set once the curve migrated and no longer trades
    pub complete: bool,
    /// Creator whose vault collects creator fees
    pub creator: Pubkey,
}

impl BondingCurveAccount {
    /// Tokens received for spending `amount` lamports
    ///
    /// # Errors
    ///
    /// Fails when the curve is complete.
    pub fn get_buy_price(&self, amount: u64) -> Result<u64, &'static str> {
        if self.complete {
            return Err("Curve is complete");
        }

        if amount == 0 {
            return Ok(0);
        }

        let n: u128 = (self.virtual_sol_reserves as u128) * (self.virtual_token_reserves as u128);
        let i: u128 = (self.virtual_sol_reserves as u128) + (amount as u128);
        let r: u128 = n / i + 1;
        let s: u128 = (self.virtual_token_reserves as u128).saturating_sub(r);

        Ok(s.min(self.real_token_reserves as u128) as u64)
    }
}
