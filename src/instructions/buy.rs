//! Instruction for buying tokens from bonding curves
//!
//! Builds the `buy` instruction for a buyer that is not necessarily the fee
//! payer of the surrounding transaction, so that many buyers can share one
//! batched transaction.

use crate::{
    accounts::{
        get_bonding_curve_pda, get_creator_vault_pda, get_global_pda,
        get_user_volume_accumulator_pda,
    },
    constants,
    error::ClientError,
};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};
use spl_associated_token_account::get_associated_token_address;

/// Instruction data for buying tokens from a bonding curve
///
/// # Fields
///
/// * `amount` - Amount of tokens to buy (in token smallest units)
/// * `max_sol_cost` - Maximum acceptable SOL cost for the purchase (slippage protection)
/// * `track_volume` - Whether to track this purchase in volume accumulators
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Buy {
    pub amount: u64,
    pub max_sol_cost: u64,
    pub track_volume: Option<bool>,
}

impl Buy {
    /// Instruction discriminator used to identify this instruction
    pub const DISCRIMINATOR: [u8; 8] = [102, 6, 61, 18, 1, 218, 235, 234];

    /// Serializes the instruction data behind its discriminator
    pub fn data(&self) -> Result<Vec<u8>, std::io::Error> {
        let mut data = Vec::with_capacity(32);
        data.extend_from_slice(&Self::DISCRIMINATOR);
        borsh::to_writer(&mut data, self)?;
        Ok(data)
    }
}

/// Creates an instruction to buy tokens from a bonding curve
///
/// `buyer` signs the instruction, pays the SOL and receives the tokens in its
/// associated token account.
///
/// # Account Requirements
///
/// 1. Global configuration PDA (readonly)
/// 2. Fee recipient account (writable)
/// 3. Token mint account (readonly)
/// 4. Bonding curve PDA (writable)
/// 5. Bonding curve token account (writable)
/// 6. Buyer's token account (writable)
/// 7. Buyer (signer, writable)
/// 8. System program (readonly)
/// 9. Token program (readonly)
/// 10. Creator vault (writable)
/// 11. Event authority (readonly)
/// 12. Pump.fun program ID (readonly)
/// 13. Global volume accumulator (writable)
/// 14. User volume accumulator (writable)
/// 15. Fee configuration account (readonly)
/// 16. Fee program ID (readonly)
///
/// # Errors
///
/// Returns an error if the instruction data cannot be serialized
pub fn buy(
    buyer: &Pubkey,
    mint: &Pubkey,
    fee_recipient: &Pubkey,
    creator: &Pubkey,
    args: Buy,
) -> Result<Instruction, ClientError> {
    let bonding_curve = get_bonding_curve_pda(mint);
    Ok(Instruction::new_with_bytes(
        constants::accounts::PUMPFUN,
        &args.data()?,
        vec![
            AccountMeta::new_readonly(get_global_pda(), false),
            AccountMeta::new(*fee_recipient, false),
            AccountMeta::new_readonly(*mint, false),
            AccountMeta::new(bonding_curve, false),
            AccountMeta::new(get_associated_token_address(&bonding_curve, mint), false),
            AccountMeta::new(get_associated_token_address(buyer, mint), false),
            AccountMeta::new(*buyer, true),
            AccountMeta::new_readonly(constants::accounts::SYSTEM_PROGRAM, false),
            AccountMeta::new_readonly(constants::accounts::TOKEN_PROGRAM, false),
            AccountMeta::new(get_creator_vault_pda(creator), false),
            AccountMeta::new_readonly(constants::accounts::EVENT_AUTHORITY, false),
            AccountMeta::new_readonly(constants::accounts::PUMPFUN, false),
            AccountMeta::new(constants::accounts::GLOBAL_VOLUME_ACCUMULATOR, false),
            AccountMeta::new(get_user_volume_accumulator_pda(buyer), false),
            AccountMeta::new_readonly(constants::accounts::FEE_CONFIG, false),
            AccountMeta::new_readonly(constants::accounts::FEE_PROGRAM, false),
        ],
    ))
}
