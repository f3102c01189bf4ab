//! Common types for the bundler
//!
//! - Cluster and priority fee configuration
//! - Batch participants (buyer wallets) and the purchase intent they share

use std::{fmt, sync::Arc};

use solana_sdk::{
    commitment_config::CommitmentConfig,
    pubkey::Pubkey,
    signature::Keypair,
    signer::Signer,
};
use spl_associated_token_account::get_associated_token_address;

/// Configuration for priority fee compute unit parameters
///
/// Priority fees allow transactions to be prioritized by validators based on
/// the fee paid per compute unit.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityFee {
    /// Maximum compute units that can be consumed by the transaction
    pub unit_limit: Option<u32>,
    /// Price in micro-lamports per compute unit
    pub unit_price: Option<u64>,
}

impl PriorityFee {
    pub fn new(unit_limit: Option<u32>, unit_price: Option<u64>) -> Self {
        PriorityFee {
            unit_limit,
            unit_price,
        }
    }
}

/// Configuration for connecting to a Solana cluster
///
/// # Fields
///
/// * `rpc_url` - HTTP endpoint for JSON RPC requests, including any embedded access key
/// * `commitment` - Commitment level for reads and confirmations
/// * `priority_fee` - Priority fee applied to batch buy transactions
#[derive(Debug, Clone)]
pub struct Cluster {
    pub rpc_url: String,
    pub commitment: CommitmentConfig,
    pub priority_fee: PriorityFee,
}

impl Cluster {
    pub fn new(rpc_url: String, commitment: CommitmentConfig, priority_fee: PriorityFee) -> Self {
        Self {
            rpc_url,
            commitment,
            priority_fee,
        }
    }

    /// Solana mainnet-beta public endpoint
    pub fn mainnet(commitment: CommitmentConfig, priority_fee: PriorityFee) -> Self {
        Self::new(
            "https://api.mainnet-beta.solana.com".to_string(),
            commitment,
            priority_fee,
        )
    }

    /// Solana devnet public endpoint
    pub fn devnet(commitment: CommitmentConfig, priority_fee: PriorityFee) -> Self {
        Self::new(
            "https://api.devnet.solana.com".to_string(),
            commitment,
            priority_fee,
        )
    }

    /// Local validator with the default port
    pub fn localnet(commitment: CommitmentConfig, priority_fee: PriorityFee) -> Self {
        Self::new("http://localhost:8899".to_string(), commitment, priority_fee)
    }
}

/// A buyer wallet taking part in a batch purchase
///
/// Each participant signs its own buy instruction and receives tokens in its
/// associated token account.
#[derive(Clone)]
pub struct Participant {
    keypair: Arc<Keypair>,
}

impl Participant {
    pub fn new(keypair: Arc<Keypair>) -> Self {
        Self { keypair }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    /// Associated token account for `mint` owned by this participant
    pub fn token_account(&self, mint: &Pubkey) -> Pubkey {
        get_associated_token_address(&self.pubkey(), mint)
    }
}

impl fmt::Debug for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Participant")
            .field("pubkey", &self.pubkey())
            .finish()
    }
}

impl From<Keypair> for Participant {
    fn from(keypair: Keypair) -> Self {
        Self::new(Arc::new(keypair))
    }
}

/// One desired buy, shared by every participant of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseIntent {
    /// Token to buy
    pub mint: Pubkey,
    /// SOL offered per participant, in lamports
    pub amount_sol: u64,
    /// Maximum acceptable slippage in basis points (1 bp = 0.01%)
    pub slippage_basis_points: u64,
    /// Whether the buy is recorded in the volume accumulators
    pub track_volume: Option<bool>,
}

impl PurchaseIntent {
    pub fn new(mint: Pubkey, amount_sol: u64, slippage_basis_points: u64) -> Self {
        Self {
            mint,
            amount_sol,
            slippage_basis_points,
            track_volume: None,
        }
    }
}
