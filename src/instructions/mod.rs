//! Instructions for the Pump.fun Solana Program
//!
//! Only the `Buy` instruction is encoded here; it is the unit every batch
//! participant contributes.

mod buy;

pub use buy::*;
