//! Global account of the Pump.fun program
//!
//! Only the fields a buy needs are interpreted: the fee recipient the `buy`
//! instruction pays into, and the initial reserves used to price the first buy
//! on a curve that does not exist yet.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::pubkey::Pubkey;

/// Program-wide configuration for pricing and fees
#[derive(Debug, Clone, BorshSerialize, BorshDeserialize)]
pub struct GlobalAccount {
    /// Anchor account discriminator
    pub discriminator: u64,
    pub initialized: bool,
    pub authority: Pubkey,
    /// Account that receives trading fees
    pub fee_recipient: Pubkey,
    pub initial_virtual_token_reserves: u64,
    pub initial_virtual_sol_reserves: u64,
    pub initial_real_token_reserves: u64,
    pub token_total_supply: u64,
    /// Fee in basis points (1/100th of a percent)
    pub fee_basis_points: u64,
    pub withdraw_authority: Pubkey,
    pub enable_migrate: bool,
    pub pool_migration_fee: u64,
    pub creator_fee_basis_points: u64,
    pub fee_recipients: [Pubkey; 7],
    pub set_creator_authority: Pubkey,
}

impl GlobalAccount {
    /// Tokens received for `amount` lamports on a curve still at its initial reserves
    pub fn get_initial_buy_price(&self, amount: u64) -> u64 {
        if amount == 0 {
            return 0;
        }

        let n: u128 = (self.initial_virtual_sol_reserves as u128)
            * (self.initial_virtual_token_reserves as u128);
        let i: u128 = (self.initial_virtual_sol_reserves as u128) + (amount as u128);
        let r: u128 = n / i + 1;
        let s: u128 = (self.initial_virtual_token_reserves as u128).saturating_sub(r);

        if s < (self.initial_real_token_reserves as u128) {
            s as u64
        } else {
            self.initial_real_token_reserves
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_global(fee_recipient: Pubkey) -> GlobalAccount {
        GlobalAccount {
            discriminator: 1,
            initialized: true,
            authority: Pubkey::new_unique(),
            fee_recipient,
            initial_virtual_token_reserves: 1_073_000_000_000_000,
            initial_virtual_sol_reserves: 30_000_000_000,
            initial_real_token_reserves: 793_100_000_000_000,
            token_total_supply: 1_000_000_000_000_000,
            fee_basis_points: 95,
            withdraw_authority: Pubkey::new_unique(),
            enable_migrate: true,
            pool_migration_fee: 15_000_001,
            creator_fee_basis_points: 5,
            fee_recipients: [Pubkey::new_unique(); 7],
            set_creator_authority: Pubkey::new_unique(),
        }
    }

    #[test]
    fn test_initial_buy_price() {
        let global = sample_global(Pubkey::new_unique());

        assert_eq!(global.get_initial_buy_price(0), 0);

        let tokens = global.get_initial_buy_price(100_000);
        assert!(tokens > 0);
        assert!(tokens <= global.initial_real_token_reserves);
    }

    #[test]
    fn test_initial_buy_price_capped_by_real_reserves() {
        let mut global = sample_global(Pubkey::new_unique());
        global.initial_real_token_reserves = 100;

        assert_eq!(global.get_initial_buy_price(1_000_000_000), 100);
    }

    #[test]
    fn test_initial_buy_price_overflow() {
        let mut global = sample_global(Pubkey::new_unique());
        global.initial_virtual_sol_reserves = u64::MAX;
        global.initial_virtual_token_reserves = u64::MAX;
        global.initial_real_token_reserves = u64::MAX / 2;

        let tokens = global.get_initial_buy_price(u64::MAX);
        assert!(tokens > 0);
        assert!(tokens <= global.initial_real_token_reserves);
    }

    #[test]
    fn test_borsh_roundtrip_prefix() {
        let global = sample_global(Pubkey::new_unique());
        let bytes = borsh::to_vec(&global).unwrap();
        let decoded = GlobalAccount::try_from_slice(&bytes).unwrap();
        assert_eq!(decoded.fee_recipient, global.fee_recipient);
    }
}
