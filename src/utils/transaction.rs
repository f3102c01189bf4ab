//! Transaction compaction
//!
//! Compiles instructions into a signed v0 transaction. Addresses present in a
//! supplied lookup table are encoded as one-byte table indices instead of
//! 32-byte keys; everything else stays inline in the account keys section.

use std::collections::HashMap;

use solana_sdk::{
    hash::Hash,
    instruction::Instruction,
    message::{v0, AddressLookupTableAccount, VersionedMessage},
    pubkey::Pubkey,
    signature::Keypair,
    signer::Signer,
    transaction::VersionedTransaction,
};
use tracing::debug;

use crate::{common::chain::ChainClient, constants::limits::MAX_TRANSACTION_SIZE, error};

/// A signed transaction together with its wire size
#[derive(Debug, Clone)]
pub struct CompiledTransaction {
    pub transaction: VersionedTransaction,
    /// Serialized size in bytes
    pub size: usize,
    pub instruction_count: usize,
    pub signer_count: usize,
    /// Lookup tables the message actually references
    pub lookup_tables: Vec<Pubkey>,
}

impl CompiledTransaction {
    /// Number of addresses resolved through lookup tables
    pub fn lookup_address_count(&self) -> usize {
        self.transaction
            .message
            .address_table_lookups()
            .map(|lookups| {
                lookups
                    .iter()
                    .map(|lookup| lookup.writable_indexes.len() + lookup.readonly_indexes.len())
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Number of addresses carried inline in the message
    pub fn static_address_count(&self) -> usize {
        self.transaction.message.static_account_keys().len()
    }

    /// Wire encoding of the transaction
    pub fn serialize(&self) -> Result<Vec<u8>, error::ClientError> {
        Ok(bincode::serialize(&self.transaction)?)
    }

    /// Fails when the transaction exceeds the network's packet size
    pub fn ensure_within_limit(&self) -> Result<(), error::ClientError> {
        if self.size > MAX_TRANSACTION_SIZE {
            return Err(error::ClientError::TransactionTooLarge {
                size: self.size,
                limit: MAX_TRANSACTION_SIZE,
            });
        }
        Ok(())
    }
}

/// Compiles and signs a transaction with a freshly fetched blockhash
///
/// # Arguments
///
/// * `chain` - Client used to fetch the recent blockhash
/// * `payer` - Fee payer, always the first signer
/// * `instructions` - Instructions in execution order
/// * `additional_signers` - Every other keypair that may be required; duplicates
///   and keypairs the message does not need are ignored
/// * `address_lookup_table_accounts` - Resolved lookup tables, empty to compile without one
///
/// # Errors
///
/// Returns an error if:
/// - Failed to retrieve the recent blockhash from the network
/// - Message compilation fails
/// - A required signer has no keypair
/// - Signing or serialization fails
pub async fn get_transaction(
    chain: &dyn ChainClient,
    payer: &Keypair,
    instructions: &[Instruction],
    additional_signers: &[&Keypair],
    address_lookup_table_accounts: &[AddressLookupTableAccount],
) -> Result<CompiledTransaction, error::ClientError> {
    let recent_blockhash = chain.get_latest_blockhash().await?;

    get_transaction_offline_prepared(
        &recent_blockhash,
        payer,
        instructions,
        additional_signers,
        address_lookup_table_accounts,
    )
}

/// Compiles and signs a transaction against a known blockhash
pub fn get_transaction_offline_prepared(
    recent_blockhash: &Hash,
    payer: &Keypair,
    instructions: &[Instruction],
    additional_signers: &[&Keypair],
    address_lookup_table_accounts: &[AddressLookupTableAccount],
) -> Result<CompiledTransaction, error::ClientError> {
    let message = v0::Message::try_compile(
        &payer.pubkey(),
        instructions,
        address_lookup_table_accounts,
        *recent_blockhash,
    )
    .map_err(|e| error::ClientError::CompileError(e.to_string()))?;

    let required = message.header.num_required_signatures as usize;
    let signers = resolve_signers(
        &message.account_keys[..required],
        std::iter::once(payer).chain(additional_signers.iter().copied()),
    )?;

    let lookup_tables = message
        .address_table_lookups
        .iter()
        .map(|lookup| lookup.account_key)
        .collect();

    let transaction = VersionedTransaction::try_new(VersionedMessage::V0(message), &signers)
        .map_err(|e| error::ClientError::SigningError(e.to_string()))?;
    let size = bincode::serialized_size(&transaction)? as usize;

    debug!(
        size,
        instructions = instructions.len(),
        signers = signers.len(),
        "compiled transaction"
    );

    Ok(CompiledTransaction {
        transaction,
        size,
        instruction_count: instructions.len(),
        signer_count: signers.len(),
        lookup_tables,
    })
}

/// Picks one keypair per required signer, in message order
fn resolve_signers<'a>(
    required: &[Pubkey],
    candidates: impl Iterator<Item = &'a Keypair>,
) -> Result<Vec<&'a Keypair>, error::ClientError> {
    let mut by_key: HashMap<Pubkey, &'a Keypair> = HashMap::new();
    for keypair in candidates {
        by_key.entry(keypair.pubkey()).or_insert(keypair);
    }

    required
        .iter()
        .map(|key| {
            by_key
                .get(key)
                .copied()
                .ok_or(error::ClientError::MissingSigner(*key))
        })
        .collect()
}
