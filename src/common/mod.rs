//! Shared types and the chain client seam
//!
//! - `types`: cluster configuration, priority fees, participants and purchase intents.
//! - `chain`: the `ChainClient` trait every component talks to the network through.

pub mod chain;
pub mod types;
