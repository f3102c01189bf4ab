//! Address lookup table lifecycle
//!
//! Creates a table owned by the payer, waits for it to settle, and appends
//! catalog addresses to it in confirmed, capacity-bounded chunks.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use solana_sdk::{
    address_lookup_table::instruction::{create_lookup_table, extend_lookup_table},
    message::AddressLookupTableAccount,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
};
use tokio_retry::{
    strategy::{ExponentialBackoff, FixedInterval},
    RetryIf,
};
use tracing::{debug, error, info, warn};

use crate::{
    catalog::AddressCatalog,
    common::{chain::ChainClient, types::PriorityFee},
    config::BundlerConfig,
    constants::limits::{
        DEFAULT_CREATE_ATTEMPTS, DEFAULT_EXTEND_CHUNK_SIZE, DEFAULT_RETRY_DELAY_MILLIS,
        DEFAULT_SETTLE_DELAY_SECS, LOOKUP_TABLE_MAX_ADDRESSES, LOOKUP_TABLE_UNIT_LIMIT,
        LOOKUP_TABLE_UNIT_PRICE,
    },
    error::ClientError,
    utils::{get_priority_fee_instructions, transaction::get_transaction},
};

/// Wait between retries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay before every retry
    Fixed(Duration),
    /// Delays of `base_millis`, `base_millis^2`, ... capped at `max_delay`
    Exponential { base_millis: u64, max_delay: Duration },
}

/// Bounded retry policy for lookup table creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one; at least one attempt is made
    pub max_attempts: usize,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_CREATE_ATTEMPTS,
            backoff: Backoff::Fixed(Duration::from_millis(DEFAULT_RETRY_DELAY_MILLIS)),
        }
    }
}

impl RetryPolicy {
    pub fn fixed(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Fixed(delay),
        }
    }

    pub fn exponential(max_attempts: usize, base_millis: u64, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Exponential {
                base_millis,
                max_delay,
            },
        }
    }

    /// Delays between attempts; one fewer than the attempt budget
    pub fn delays(&self) -> Vec<Duration> {
        let retries = self.max_attempts.saturating_sub(1);
        match self.backoff {
            Backoff::Fixed(delay) => FixedInterval::new(delay).take(retries).collect(),
            Backoff::Exponential {
                base_millis,
                max_delay,
            } => ExponentialBackoff::from_millis(base_millis)
                .max_delay(max_delay)
                .take(retries)
                .collect(),
        }
    }
}

/// Outcome of an extend call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendReport {
    /// Addresses appended, in the order they were sent
    pub appended: Vec<Pubkey>,
    /// Requested addresses that were already stored or repeated in the request
    pub skipped: usize,
    /// One signature per confirmed extend transaction
    pub signatures: Vec<Signature>,
}

impl ExtendReport {
    pub fn is_noop(&self) -> bool {
        self.appended.is_empty()
    }
}

/// Creates and extends lookup tables owned by a single authority
///
/// The authority also pays for every transaction. Extends against one table
/// should only ever be issued from one manager at a time.
pub struct LookupTableManager {
    chain: Arc<dyn ChainClient>,
    authority: Arc<Keypair>,
    priority_fee: PriorityFee,
    retry: RetryPolicy,
    settle_delay: Duration,
    extend_chunk_size: usize,
}

impl LookupTableManager {
    pub fn new(chain: Arc<dyn ChainClient>, authority: Arc<Keypair>) -> Self {
        Self {
            chain,
            authority,
            priority_fee: PriorityFee::new(
                Some(LOOKUP_TABLE_UNIT_LIMIT),
                Some(LOOKUP_TABLE_UNIT_PRICE),
            ),
            retry: RetryPolicy::default(),
            settle_delay: Duration::from_secs(DEFAULT_SETTLE_DELAY_SECS),
            extend_chunk_size: DEFAULT_EXTEND_CHUNK_SIZE,
        }
    }

    pub fn from_config(
        chain: Arc<dyn ChainClient>,
        authority: Arc<Keypair>,
        config: &BundlerConfig,
    ) -> Self {
        Self::new(chain, authority)
            .with_priority_fee(config.lookup_table_fee)
            .with_retry_policy(config.retry)
            .with_settle_delay(config.settle_delay)
            .with_extend_chunk_size(config.extend_chunk_size)
    }

    pub fn with_priority_fee(mut self, priority_fee: PriorityFee) -> Self {
        self.priority_fee = priority_fee;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Maximum addresses per extend transaction, clamped to at least one
    pub fn with_extend_chunk_size(mut self, extend_chunk_size: usize) -> Self {
        self.extend_chunk_size = extend_chunk_size.max(1);
        self
    }

    pub fn authority(&self) -> Pubkey {
        self.authority.pubkey()
    }

    /// Creates a new lookup table and returns its address
    ///
    /// The table address is derived from the authority and a recent slot. A
    /// slot that is no longer recent when the transaction lands gets it
    /// rejected, so every attempt re-reads the slot. Only errors that a fresh
    /// attempt could clear are retried (see [`ClientError::is_retryable`]).
    /// Gives up with [`ClientError::LookupTableCreationFailed`], carrying the
    /// last attempt's error.
    pub async fn create(&self) -> Result<Pubkey, ClientError> {
        let attempts = AtomicUsize::new(0);

        let result = RetryIf::spawn(
            self.retry.delays(),
            || self.try_create(&attempts),
            ClientError::is_retryable,
        )
        .await;

        let attempts = attempts.into_inner();
        match result {
            Ok(table) => {
                info!(%table, attempts, "lookup table created");
                Ok(table)
            }
            Err(err) => {
                error!(
                    attempts,
                    error = %err,
                    logs = ?err.simulation_logs().unwrap_or_default(),
                    "lookup table creation failed"
                );
                Err(ClientError::LookupTableCreationFailed {
                    attempts,
                    last: Box::new(err),
                })
            }
        }
    }

    async fn try_create(&self, attempts: &AtomicUsize) -> Result<Pubkey, ClientError> {
        let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let authority = self.authority.pubkey();

        let recent_slot = self.chain.get_slot().await?;
        let (create_ix, table) = create_lookup_table(authority, authority, recent_slot);
        debug!(attempt, recent_slot, %table, "creating lookup table");

        let mut instructions = get_priority_fee_instructions(&self.priority_fee);
        instructions.push(create_ix);

        let result = self.submit(&instructions).await;
        if let Err(err) = &result {
            warn!(
                attempt,
                error = %err,
                logs = ?err.simulation_logs().unwrap_or_default(),
                "lookup table creation attempt rejected"
            );
        }
        result.map(|_| table)
    }

    /// Waits for a freshly created table to become usable
    pub async fn settle(&self) {
        if self.settle_delay.is_zero() {
            return;
        }
        info!(delay_secs = self.settle_delay.as_secs_f64(), "waiting for lookup table to settle");
        tokio::time::sleep(self.settle_delay).await;
    }

    /// Resolves a table's current contents
    pub async fn fetch(&self, table: &Pubkey) -> Result<AddressLookupTableAccount, ClientError> {
        self.chain
            .get_lookup_table(table)
            .await?
            .ok_or(ClientError::LookupTableNotFound(*table))
    }

    /// Appends `addresses` to `table`
    ///
    /// Addresses the table already stores, and repeats within `addresses`, are
    /// skipped; an empty remainder is a successful no-op. The result must fit
    /// the table's capacity or nothing is sent. The remainder goes out in
    /// order, one confirmed transaction per chunk. Failures are returned as is
    /// and never retried; chunks confirmed before a failure stay appended.
    pub async fn extend(
        &self,
        table: &Pubkey,
        addresses: &[Pubkey],
    ) -> Result<ExtendReport, ClientError> {
        let current = self.fetch(table).await?;
        let requested: AddressCatalog = addresses.iter().copied().collect();
        let pending = requested.missing_from(&current);

        let mut report = ExtendReport {
            skipped: addresses.len() - pending.len(),
            ..Default::default()
        };

        if pending.is_empty() {
            debug!(%table, skipped = report.skipped, "lookup table already holds every address");
            return Ok(report);
        }

        let resulting = current.addresses.len() + pending.len();
        if resulting > LOOKUP_TABLE_MAX_ADDRESSES {
            return Err(ClientError::CatalogTooLarge {
                len: resulting,
                capacity: LOOKUP_TABLE_MAX_ADDRESSES,
            });
        }

        let authority = self.authority.pubkey();
        for chunk in pending.chunks(self.extend_chunk_size) {
            let mut instructions = get_priority_fee_instructions(&self.priority_fee);
            instructions.push(extend_lookup_table(
                *table,
                authority,
                Some(authority),
                chunk.to_vec(),
            ));

            let signature = self.submit(&instructions).await?;
            report.appended.extend_from_slice(chunk);
            report.signatures.push(signature);
            debug!(
                %table,
                %signature,
                chunk = chunk.len(),
                total = report.appended.len(),
                "extended lookup table"
            );
        }

        info!(
            %table,
            appended = report.appended.len(),
            skipped = report.skipped,
            "lookup table extended"
        );
        Ok(report)
    }

    /// Creates a table, waits for it to settle and fills it with `catalog`
    ///
    /// The catalog is checked against table capacity before anything is sent.
    pub async fn create_and_populate(
        &self,
        catalog: &AddressCatalog,
    ) -> Result<(Pubkey, ExtendReport), ClientError> {
        catalog.ensure_fits_table()?;

        let table = self.create().await?;
        self.settle().await;
        let report = self.extend(&table, catalog.addresses()).await?;

        Ok((table, report))
    }

    /// Simulates, then sends and confirms, a transaction signed by the authority
    async fn submit(
        &self,
        instructions: &[solana_sdk::instruction::Instruction],
    ) -> Result<Signature, ClientError> {
        let compiled =
            get_transaction(self.chain.as_ref(), &self.authority, instructions, &[], &[]).await?;
        compiled.ensure_within_limit()?;

        let simulation = self
            .chain
            .simulate_transaction(&compiled.transaction)
            .await?
            .into_result()?;
        debug!(units = ?simulation.units_consumed, "simulation passed");

        self.chain
            .send_and_confirm_transaction(&compiled.transaction)
            .await
    }
}
