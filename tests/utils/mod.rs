#![allow(dead_code)]

mod chain;
mod setup;

pub use chain::*;
pub use setup::*;
