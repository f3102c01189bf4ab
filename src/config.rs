//! Runtime configuration
//!
//! Everything the bundler needs is passed in explicitly through
//! [`BundlerConfig`] and [`KeySet`]; nothing is read from process-wide state.

use std::{sync::Arc, time::Duration};

use solana_sdk::{pubkey::Pubkey, signature::Keypair};

use crate::{
    assembler::PartialFailurePolicy,
    common::types::{Cluster, Participant, PriorityFee, PurchaseIntent},
    constants::limits::{
        DEFAULT_EXTEND_CHUNK_SIZE, DEFAULT_SETTLE_DELAY_SECS, DEFAULT_SLIPPAGE_BASIS_POINTS,
        LOOKUP_TABLE_UNIT_LIMIT, LOOKUP_TABLE_UNIT_PRICE,
    },
    error::ClientError,
    lookup_table::RetryPolicy,
};

/// Settings for one bundler instance
///
/// # Fields
///
/// * `cluster` - RPC endpoint, commitment and the priority fee for buy transactions
/// * `mint` - Token every participant buys
/// * `creator` - Token creator, used until the bonding curve exists
/// * `lookup_table` - Previously created lookup table, if any
/// * `amount_sol` - Lamports each participant spends
/// * `slippage_basis_points` - Allowed slippage on top of `amount_sol`
/// * `track_volume` - Whether buys are recorded in the volume accumulators
/// * `lookup_table_fee` - Priority fee for lookup table creation and extension
/// * `retry` - Retry policy for lookup table creation
/// * `settle_delay` - Wait between creating a table and extending it
/// * `extend_chunk_size` - Addresses appended per extend transaction
/// * `failure_policy` - Whether a failed participant is skipped or aborts the batch
#[derive(Debug, Clone)]
pub struct BundlerConfig {
    pub cluster: Cluster,
    pub mint: Pubkey,
    pub creator: Pubkey,
    pub lookup_table: Option<Pubkey>,
    pub amount_sol: u64,
    pub slippage_basis_points: u64,
    pub track_volume: Option<bool>,
    pub lookup_table_fee: PriorityFee,
    pub retry: RetryPolicy,
    pub settle_delay: Duration,
    pub extend_chunk_size: usize,
    pub failure_policy: PartialFailurePolicy,
}

impl BundlerConfig {
    /// Configuration with default fees, retries and slippage
    pub fn new(cluster: Cluster, mint: Pubkey, creator: Pubkey, amount_sol: u64) -> Self {
        Self {
            cluster,
            mint,
            creator,
            lookup_table: None,
            amount_sol,
            slippage_basis_points: DEFAULT_SLIPPAGE_BASIS_POINTS,
            track_volume: None,
            lookup_table_fee: PriorityFee::new(
                Some(LOOKUP_TABLE_UNIT_LIMIT),
                Some(LOOKUP_TABLE_UNIT_PRICE),
            ),
            retry: RetryPolicy::default(),
            settle_delay: Duration::from_secs(DEFAULT_SETTLE_DELAY_SECS),
            extend_chunk_size: DEFAULT_EXTEND_CHUNK_SIZE,
            failure_policy: PartialFailurePolicy::default(),
        }
    }

    /// The purchase every participant makes
    pub fn intent(&self) -> PurchaseIntent {
        PurchaseIntent {
            mint: self.mint,
            amount_sol: self.amount_sol,
            slippage_basis_points: self.slippage_basis_points,
            track_volume: self.track_volume,
        }
    }
}

/// Decodes a base-58 secret key into a keypair
pub fn parse_keypair(encoded: &str) -> Result<Keypair, ClientError> {
    let bytes = bs58::decode(encoded.trim())
        .into_vec()
        .map_err(|e| ClientError::InvalidKey(format!("not base-58: {e}")))?;

    Keypair::try_from(bytes.as_slice())
        .map_err(|e| ClientError::InvalidKey(format!("not a keypair: {e}")))
}

/// Signing keys for a run: the fee payer and the buyer wallets
///
/// The payer signs every transaction and owns lookup tables. It only buys
/// when no buyer wallets are given.
#[derive(Debug, Clone)]
pub struct KeySet {
    pub signer: Arc<Keypair>,
    pub buyers: Vec<Participant>,
}

impl KeySet {
    pub fn new(signer: Arc<Keypair>, buyers: Vec<Participant>) -> Self {
        Self { signer, buyers }
    }

    /// Parses the payer key and a comma-separated list of buyer keys
    ///
    /// Empty entries in `buyers` are ignored.
    pub fn from_base58(signer: &str, buyers: &str) -> Result<Self, ClientError> {
        let signer = Arc::new(parse_keypair(signer)?);
        let buyers = buyers
            .split(',')
            .filter(|key| !key.trim().is_empty())
            .map(|key| parse_keypair(key).map(Participant::from))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { signer, buyers })
    }

    /// The payer as a participant, for single-wallet buys
    pub fn signer_participant(&self) -> Participant {
        Participant::new(self.signer.clone())
    }

    /// Wallets that buy: the buyers, or the payer alone when there are none
    pub fn participants(&self) -> Vec<Participant> {
        if self.buyers.is_empty() {
            vec![self.signer_participant()]
        } else {
            self.buyers.clone()
        }
    }
}
