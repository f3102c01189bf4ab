//! Utility helpers
//!
//! - `transaction`: compiles instructions into compact, signed versioned transactions.
//! - Compute budget, slippage and unit conversion helpers.

pub mod transaction;

use solana_sdk::{compute_budget::ComputeBudgetInstruction, instruction::Instruction};

use crate::common::types::PriorityFee;

/// Lamports per SOL
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Maximum SOL cost for a buy: `amount` plus `basis_points` of it
///
/// # Examples
///
/// ```
/// use pumpfun_bundle::utils::calculate_with_slippage_buy;
///
/// assert_eq!(calculate_with_slippage_buy(100_000, 100), 101_000);
/// ```
pub fn calculate_with_slippage_buy(amount: u64, basis_points: u64) -> u64 {
    let slippage = (amount as u128) * (basis_points as u128) / 10_000;
    amount.saturating_add(slippage.min(u64::MAX as u128) as u64)
}

/// Converts a SOL amount to lamports, rounding to the nearest lamport
pub fn sol_to_lamports(sol: f64) -> u64 {
    (sol * LAMPORTS_PER_SOL as f64).round() as u64
}

/// Converts lamports to SOL for display
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Compute budget instructions for a priority fee, limit first
///
/// Unset fields produce no instruction, so the default fee yields an empty list.
pub fn get_priority_fee_instructions(priority_fee: &PriorityFee) -> Vec<Instruction> {
    let mut instructions = Vec::new();

    if let Some(limit) = priority_fee.unit_limit {
        instructions.push(ComputeBudgetInstruction::set_compute_unit_limit(limit));
    }

    if let Some(price) = priority_fee.unit_price {
        instructions.push(ComputeBudgetInstruction::set_compute_unit_price(price));
    }

    instructions
}
