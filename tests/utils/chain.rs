use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use pumpfun_bundle::{
    common::chain::{ChainClient, SimulationOutcome},
    constants::limits::{LOOKUP_TABLE_MAX_ADDRESSES, MAX_TRANSACTION_SIZE},
    error::ClientError,
};
use solana_sdk::{
    address_lookup_table::{self, instruction::ProgramInstruction},
    hash::Hash,
    message::AddressLookupTableAccount,
    pubkey::Pubkey,
    signature::Signature,
    transaction::VersionedTransaction,
};

#[derive(Debug, Clone)]
pub struct MockTable {
    pub authority: Pubkey,
    pub addresses: Vec<Pubkey>,
}

#[derive(Default)]
struct ChainState {
    slot: u64,
    blockhash: Hash,
    accounts: HashMap<Pubkey, Vec<u8>>,
    balances: HashMap<Pubkey, u64>,
    tables: HashMap<Pubkey, MockTable>,
    stale_creates: usize,
    create_attempts: usize,
    create_slots: Vec<u64>,
    confirmation_error: Option<String>,
    simulation_error: Option<String>,
    simulations: usize,
    sent: Vec<VersionedTransaction>,
    confirmed: Vec<VersionedTransaction>,
}

/// In-memory chain that applies lookup table program instructions
pub struct MockChain {
    state: Mutex<ChainState>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ChainState {
                slot: 1_000,
                blockhash: Hash::new_unique(),
                ..Default::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap()
    }

    pub fn set_balance(&self, owner: Pubkey, lamports: u64) {
        self.state().balances.insert(owner, lamports);
    }

    pub fn set_account(&self, address: Pubkey, data: Vec<u8>) {
        self.state().accounts.insert(address, data);
    }

    /// Stores a table directly, as if it had been created and extended earlier
    pub fn insert_table(&self, authority: Pubkey, addresses: Vec<Pubkey>) -> Pubkey {
        let key = Pubkey::new_unique();
        self.state().tables.insert(
            key,
            MockTable {
                authority,
                addresses,
            },
        );
        key
    }

    pub fn table(&self, key: &Pubkey) -> Option<MockTable> {
        self.state().tables.get(key).cloned()
    }

    pub fn table_count(&self) -> usize {
        self.state().tables.len()
    }

    /// Rejects the next `count` table creations because their slot is no longer recent
    pub fn reject_creates_with_stale_slot(&self, count: usize) {
        self.state().stale_creates = count;
    }

    pub fn create_attempts(&self) -> usize {
        self.state().create_attempts
    }

    /// The recent slot of every table creation seen, in order
    pub fn create_slots(&self) -> Vec<u64> {
        self.state().create_slots.clone()
    }

    /// Fails every confirmed send with an error no retry can fix
    pub fn fail_confirmations(&self, reason: &str) {
        self.state().confirmation_error = Some(reason.to_string());
    }

    pub fn fail_simulations(&self, err: &str) {
        self.state().simulation_error = Some(err.to_string());
    }

    pub fn simulations(&self) -> usize {
        self.state().simulations
    }

    pub fn sent(&self) -> Vec<VersionedTransaction> {
        self.state().sent.clone()
    }

    pub fn confirmed(&self) -> Vec<VersionedTransaction> {
        self.state().confirmed.clone()
    }

    fn lookup_table_instructions(
        transaction: &VersionedTransaction,
    ) -> Vec<(ProgramInstruction, Vec<Pubkey>)> {
        let keys = transaction.message.static_account_keys();
        transaction
            .message
            .instructions()
            .iter()
            .filter(|ix| keys[ix.program_id_index as usize] == address_lookup_table::program::id())
            .map(|ix| {
                let instruction: ProgramInstruction = bincode::deserialize(&ix.data).unwrap();
                let accounts = ix.accounts.iter().map(|i| keys[*i as usize]).collect();
                (instruction, accounts)
            })
            .collect()
    }

    fn check_transaction(transaction: &VersionedTransaction) -> Result<(), ClientError> {
        if !transaction.verify_with_results().iter().all(|ok| *ok) {
            return Err(ClientError::OtherError(
                "signature verification failed".to_string(),
            ));
        }
        let size = bincode::serialized_size(transaction)? as usize;
        if size > MAX_TRANSACTION_SIZE {
            return Err(ClientError::OtherError(format!(
                "transaction too large: {size} bytes"
            )));
        }
        Ok(())
    }

    fn apply(state: &mut ChainState, transaction: &VersionedTransaction) -> Result<(), ClientError> {
        for (instruction, accounts) in Self::lookup_table_instructions(transaction) {
            match instruction {
                ProgramInstruction::CreateLookupTable { .. } => {
                    state.tables.insert(
                        accounts[0],
                        MockTable {
                            authority: accounts[1],
                            addresses: Vec::new(),
                        },
                    );
                }
                ProgramInstruction::ExtendLookupTable { new_addresses } => {
                    let table = state.tables.get_mut(&accounts[0]).ok_or_else(|| {
                        ClientError::OtherError("lookup table does not exist".to_string())
                    })?;
                    if table.authority != accounts[1] {
                        return Err(ClientError::OtherError("invalid authority".to_string()));
                    }
                    if table.addresses.len() + new_addresses.len() > LOOKUP_TABLE_MAX_ADDRESSES {
                        return Err(ClientError::OtherError("lookup table is full".to_string()));
                    }
                    table.addresses.extend(new_addresses);
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn get_slot(&self) -> Result<u64, ClientError> {
        let mut state = self.state();
        state.slot += 1;
        Ok(state.slot)
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, ClientError> {
        Ok(self.state().blockhash)
    }

    async fn get_balance(&self, address: &Pubkey) -> Result<u64, ClientError> {
        Ok(self.state().balances.get(address).copied().unwrap_or(0))
    }

    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, ClientError> {
        Ok(self.state().accounts.get(address).cloned())
    }

    async fn get_lookup_table(
        &self,
        address: &Pubkey,
    ) -> Result<Option<AddressLookupTableAccount>, ClientError> {
        Ok(self
            .state()
            .tables
            .get(address)
            .map(|table| AddressLookupTableAccount {
                key: *address,
                addresses: table.addresses.clone(),
            }))
    }

    async fn simulate_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<SimulationOutcome, ClientError> {
        let mut state = self.state();
        state.simulations += 1;

        for (instruction, _) in Self::lookup_table_instructions(transaction) {
            if let ProgramInstruction::CreateLookupTable { recent_slot, .. } = instruction {
                state.create_attempts += 1;
                state.create_slots.push(recent_slot);
                if state.stale_creates > 0 {
                    state.stale_creates -= 1;
                    return Ok(SimulationOutcome {
                        err: Some("InstructionError(2, InvalidInstructionData)".to_string()),
                        logs: vec![format!("{recent_slot} is not a recent slot")],
                        units_consumed: Some(1_500),
                    });
                }
            }
        }

        Ok(SimulationOutcome {
            err: state.simulation_error.clone(),
            logs: Vec::new(),
            units_consumed: Some(120_000),
        })
    }

    async fn send_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<Signature, ClientError> {
        Self::check_transaction(transaction)?;
        self.state().sent.push(transaction.clone());
        Ok(transaction.signatures[0])
    }

    async fn send_and_confirm_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<Signature, ClientError> {
        Self::check_transaction(transaction)?;
        let mut state = self.state();
        if let Some(reason) = &state.confirmation_error {
            return Err(ClientError::OtherError(reason.clone()));
        }
        Self::apply(&mut state, transaction)?;
        state.slot += 1;
        state.confirmed.push(transaction.clone());
        Ok(transaction.signatures[0])
    }
}
