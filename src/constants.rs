//! Constants used by the bundler
//!
//! Program ids and well-known accounts of the Pump.fun program, PDA seeds, and
//! the network limits that bound lookup tables and transactions.

/// Well-known account addresses
pub mod accounts {
    use solana_sdk::{pubkey, pubkey::Pubkey};

    /// Pump.fun program id
    pub const PUMPFUN: Pubkey = pubkey!("6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P");
    /// Event authority PDA of the Pump.fun program
    pub const EVENT_AUTHORITY: Pubkey = pubkey!("Ce6TQqeHC9p8KetsN6JsjHK7UTZk7nasjjnr7XxXp9F1");
    /// Global volume accumulator
    pub const GLOBAL_VOLUME_ACCUMULATOR: Pubkey =
        pubkey!("Hq2wp8uJ9jCPsYgNHex8RtqdvMPfVGoYwjvF1ATiwn2Y");
    /// Fee configuration account
    pub const FEE_CONFIG: Pubkey = pubkey!("8Wf5TiAheLUqBrKXeYg2JtAFFMWtKdG2BSFgqUcPVwTt");
    /// Fee program that owns the fee configuration
    pub const FEE_PROGRAM: Pubkey = pubkey!("pfeeUxB6jkeY1Hxd7CsFCAjcbHA9rWtchMGdZ6VojVZ");
    pub const SYSTEM_PROGRAM: Pubkey = solana_sdk::system_program::ID;
    pub const TOKEN_PROGRAM: Pubkey = spl_token::ID;
    pub const ASSOCIATED_TOKEN_PROGRAM: Pubkey = spl_associated_token_account::ID;
    pub const RENT: Pubkey = solana_sdk::sysvar::rent::ID;
}

/// PDA seeds of the Pump.fun program
pub mod seeds {
    pub const GLOBAL_SEED: &[u8] = b"global";
    pub const BONDING_CURVE_SEED: &[u8] = b"bonding-curve";
    pub const CREATOR_VAULT_SEED: &[u8] = b"creator-vault";
    pub const USER_VOLUME_ACCUMULATOR_SEED: &[u8] = b"user_volume_accumulator";
}

/// Network limits and operational defaults
pub mod limits {
    /// Maximum serialized size of a transaction (IPv6 MTU minus headers)
    pub const MAX_TRANSACTION_SIZE: usize = 1232;
    /// Maximum number of addresses a single lookup table can hold
    pub const LOOKUP_TABLE_MAX_ADDRESSES: usize = 256;
    /// Addresses appended per extend transaction; with the compute budget
    /// instructions a chunk of 30 exceeds the transaction size limit
    pub const DEFAULT_EXTEND_CHUNK_SIZE: usize = 25;
    /// Attempts made at creating a lookup table before giving up
    pub const DEFAULT_CREATE_ATTEMPTS: usize = 5;
    /// Seconds to wait after creation before the table is extended or used
    pub const DEFAULT_SETTLE_DELAY_SECS: u64 = 15;
    /// Delay between creation attempts
    pub const DEFAULT_RETRY_DELAY_MILLIS: u64 = 400;
    /// Default slippage tolerance, in basis points
    pub const DEFAULT_SLIPPAGE_BASIS_POINTS: u64 = 100;
    /// Compute unit limit for lookup table maintenance transactions
    pub const LOOKUP_TABLE_UNIT_LIMIT: u32 = 50_000;
    /// Compute unit price for lookup table maintenance transactions
    pub const LOOKUP_TABLE_UNIT_PRICE: u64 = 500_000;
}
