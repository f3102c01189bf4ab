#![doc = include_str!("../RUSTDOC.md")]

pub mod accounts;
pub mod assembler;
pub mod catalog;
pub mod common;
pub mod config;
pub mod constants;
pub mod error;
pub mod instructions;
pub mod lookup_table;
pub mod report;
pub mod utils;

use std::sync::Arc;

use assembler::{AssembledBatch, BuyInstructionSource, InstructionAssembler, PumpFunSource};
use catalog::AddressCatalog;
use common::{chain::ChainClient, types::Participant};
use config::BundlerConfig;
use lookup_table::LookupTableManager;
use report::SizeComparison;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    message::AddressLookupTableAccount,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
};
use tracing::{error, info, warn};
use utils::transaction::{get_transaction, get_transaction_offline_prepared, CompiledTransaction};

/// Result of a batch buy
#[derive(Debug, Clone)]
pub struct BundleOutcome {
    pub compiled: CompiledTransaction,
    pub assembled: AssembledBatch,
    /// Batch addresses the lookup table lacks; they stay inline
    pub missing_from_table: Vec<Pubkey>,
    /// Set when the transaction was submitted
    pub signature: Option<Signature>,
}

/// Main client for batched Pump.fun buys
///
/// Packs the buys of many wallets into one versioned transaction. The fee
/// payer signs for the transaction and owns any lookup table created; every
/// participant signs its own buy.
///
/// # Examples
///
/// ```no_run
/// use pumpfun_bundle::{
///     common::types::{Cluster, PriorityFee},
///     config::BundlerConfig,
///     Bundler,
/// };
/// use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey, signature::Keypair};
/// use std::sync::Arc;
///
/// let payer = Arc::new(Keypair::new());
/// let cluster = Cluster::devnet(CommitmentConfig::confirmed(), PriorityFee::default());
/// let config = BundlerConfig::new(cluster, Pubkey::new_unique(), Pubkey::new_unique(), 100_000);
/// let bundler = Bundler::new(payer, config);
/// ```
pub struct Bundler {
    /// Fee payer and lookup table authority
    pub payer: Arc<Keypair>,
    /// Network access
    pub chain: Arc<dyn ChainClient>,
    pub config: BundlerConfig,
    /// Pricing and buy instruction builder
    pub source: Arc<dyn BuyInstructionSource>,
}

impl Bundler {
    /// Creates a bundler talking to the configured cluster over RPC
    ///
    /// # Arguments
    ///
    /// * `payer` - Keypair that pays fees and owns created lookup tables
    /// * `config` - Cluster, token and batch settings
    pub fn new(payer: Arc<Keypair>, config: BundlerConfig) -> Self {
        let rpc = Arc::new(RpcClient::new_with_commitment(
            config.cluster.rpc_url.clone(),
            config.cluster.commitment,
        ));

        Self::with_chain(payer, rpc, config)
    }

    /// Creates a bundler over an existing chain client
    pub fn with_chain(
        payer: Arc<Keypair>,
        chain: Arc<dyn ChainClient>,
        config: BundlerConfig,
    ) -> Self {
        let source = Arc::new(PumpFunSource::new(chain.clone(), config.creator));

        Self {
            payer,
            chain,
            config,
            source,
        }
    }

    /// Replaces the instruction source
    pub fn with_source(mut self, source: Arc<dyn BuyInstructionSource>) -> Self {
        self.source = source;
        self
    }

    pub fn lookup_table_manager(&self) -> LookupTableManager {
        LookupTableManager::from_config(self.chain.clone(), self.payer.clone(), &self.config)
    }

    pub fn assembler(&self) -> InstructionAssembler {
        InstructionAssembler::new(
            self.source.clone(),
            self.config.failure_policy,
            self.config.cluster.priority_fee,
        )
    }

    /// Balance of every participant, in lamports and participant order
    pub async fn participant_balances(
        &self,
        participants: &[Participant],
    ) -> Result<Vec<(Pubkey, u64)>, error::ClientError> {
        let mut balances = Vec::with_capacity(participants.len());
        for participant in participants {
            let owner = participant.pubkey();
            let balance = self.chain.get_balance(&owner).await?;
            info!(%owner, sol = utils::lamports_to_sol(balance), "participant balance");
            balances.push((owner, balance));
        }
        Ok(balances)
    }

    /// Every address a batch buy by `participants` references
    pub async fn catalog(
        &self,
        participants: &[Participant],
    ) -> Result<AddressCatalog, error::ClientError> {
        let quote = self
            .source
            .quote(&self.config.mint, self.config.amount_sol)
            .await?;

        Ok(AddressCatalog::for_batch(
            &self.payer.pubkey(),
            participants,
            &self.config.mint,
            &quote.creator,
            &quote.fee_recipient,
        ))
    }

    /// Creates a lookup table holding the batch catalog of `participants`
    ///
    /// Creation is retried per the configured policy; the table is then given
    /// time to settle and extended with the catalog.
    ///
    /// # Returns
    ///
    /// The address of the new table
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The catalog does not fit in one table (checked before anything is sent)
    /// - Every creation attempt fails
    /// - An extend transaction fails
    pub async fn prepare_lookup_table(
        &self,
        participants: &[Participant],
    ) -> Result<Pubkey, error::ClientError> {
        let catalog = self.catalog(participants).await?;
        info!(addresses = catalog.len(), "preparing lookup table");

        let (table, report) = self
            .lookup_table_manager()
            .create_and_populate(&catalog)
            .await?;

        info!(%table, appended = report.appended.len(), "lookup table ready");
        Ok(table)
    }

    async fn resolve_lookup_tables(
        &self,
        lookup_table: Option<Pubkey>,
    ) -> Result<Vec<AddressLookupTableAccount>, error::ClientError> {
        match lookup_table {
            Some(table) => Ok(vec![self.lookup_table_manager().fetch(&table).await?]),
            None => Ok(Vec::new()),
        }
    }

    fn signers<'a>(&self, participants: &'a [Participant]) -> Vec<&'a Keypair> {
        participants.iter().map(Participant::keypair).collect()
    }

    /// Buys `config.amount_sol` worth of the token for every participant in one transaction
    ///
    /// # Arguments
    ///
    /// * `participants` - Buyer wallets, in the order their buys are placed
    /// * `lookup_table` - Table to compact the transaction with, if any
    /// * `submit` - Whether to simulate and send; otherwise the transaction is only built
    ///
    /// # Returns
    ///
    /// The compiled transaction, the assembled batch and, when submitted, the signature
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The batch cannot be assembled
    /// - The lookup table cannot be fetched
    /// - The transaction exceeds the size limit
    /// - Simulation fails or the network rejects the transaction
    pub async fn bundle_buy(
        &self,
        participants: &[Participant],
        lookup_table: Option<Pubkey>,
        submit: bool,
    ) -> Result<BundleOutcome, error::ClientError> {
        let assembled = self
            .assembler()
            .assemble(participants, &self.config.intent())
            .await?;
        let tables = self.resolve_lookup_tables(lookup_table).await?;

        let missing_from_table = match tables.first() {
            Some(table) => {
                let included: Vec<Pubkey> = assembled.included().collect();
                let buyers: Vec<Participant> = participants
                    .iter()
                    .filter(|participant| included.contains(&participant.pubkey()))
                    .cloned()
                    .collect();
                let catalog = AddressCatalog::for_batch(
                    &self.payer.pubkey(),
                    &buyers,
                    &self.config.mint,
                    &assembled.quote.creator,
                    &assembled.quote.fee_recipient,
                );
                let missing = catalog.missing_from(table);
                if !missing.is_empty() {
                    warn!(
                        table = %table.key,
                        missing = missing.len(),
                        "lookup table lacks batch addresses, they stay inline"
                    );
                }
                missing
            }
            None => Vec::new(),
        };

        let compiled = get_transaction(
            self.chain.as_ref(),
            &self.payer,
            &assembled.instructions,
            &self.signers(participants),
            &tables,
        )
        .await?;

        info!(
            size = compiled.size,
            instructions = compiled.instruction_count,
            signers = compiled.signer_count,
            table_addresses = compiled.lookup_address_count(),
            "batch transaction built"
        );
        compiled.ensure_within_limit()?;

        if !submit {
            return Ok(BundleOutcome {
                compiled,
                assembled,
                missing_from_table,
                signature: None,
            });
        }

        let simulation = self
            .chain
            .simulate_transaction(&compiled.transaction)
            .await?;
        if let Some(err) = &simulation.err {
            error!(%err, logs = ?simulation.logs, "simulation failed");
        }
        let simulation = simulation.into_result()?;
        info!(units = ?simulation.units_consumed, "simulation passed");

        let signature = self.chain.send_transaction(&compiled.transaction).await?;
        info!(%signature, "batch transaction sent");

        Ok(BundleOutcome {
            compiled,
            assembled,
            missing_from_table,
            signature: Some(signature),
        })
    }

    /// Compiles the same batch with and without `lookup_table` and compares sizes
    ///
    /// Both variants share one blockhash so that only the addressing differs.
    pub async fn compare_sizes(
        &self,
        participants: &[Participant],
        lookup_table: Pubkey,
    ) -> Result<SizeComparison, error::ClientError> {
        let assembled = self
            .assembler()
            .assemble(participants, &self.config.intent())
            .await?;
        let tables = self.resolve_lookup_tables(Some(lookup_table)).await?;
        let recent_blockhash = self.chain.get_latest_blockhash().await?;
        let signers = self.signers(participants);

        let without = get_transaction_offline_prepared(
            &recent_blockhash,
            &self.payer,
            &assembled.instructions,
            &signers,
            &[],
        )?;
        let with = get_transaction_offline_prepared(
            &recent_blockhash,
            &self.payer,
            &assembled.instructions,
            &signers,
            &tables,
        )?;

        let comparison = SizeComparison::new(&without, &with);
        info!(
            without_table = comparison.without_table,
            with_table = comparison.with_table,
            saved = comparison.byte_savings(),
            "compared transaction sizes"
        );
        Ok(comparison)
    }
}
