//! Chain client abstraction
//!
//! Every network call the bundler makes goes through [`ChainClient`]. The
//! nonblocking `RpcClient` implements it for real clusters; tests provide an
//! in-memory chain instead.

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    address_lookup_table::state::AddressLookupTable, hash::Hash,
    message::AddressLookupTableAccount, pubkey::Pubkey, signature::Signature,
    transaction::VersionedTransaction,
};

use crate::error::ClientError;

/// Result of simulating a transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationOutcome {
    /// Runtime error, if the simulation failed
    pub err: Option<String>,
    /// Program logs emitted during the simulation
    pub logs: Vec<String>,
    pub units_consumed: Option<u64>,
}

impl SimulationOutcome {
    /// Converts a failed simulation into [`ClientError::SimulationFailed`]
    pub fn into_result(self) -> Result<Self, ClientError> {
        match self.err {
            Some(err) => Err(ClientError::SimulationFailed {
                err,
                logs: self.logs,
            }),
            None => Ok(self),
        }
    }
}

/// Network operations the bundler depends on
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Current slot at the client's commitment
    async fn get_slot(&self) -> Result<u64, ClientError>;

    async fn get_latest_blockhash(&self) -> Result<Hash, ClientError>;

    /// Balance in lamports
    async fn get_balance(&self, address: &Pubkey) -> Result<u64, ClientError>;

    /// Raw account data, `None` when the account does not exist
    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, ClientError>;

    /// Resolves a lookup table into the form message compilation consumes
    async fn get_lookup_table(
        &self,
        address: &Pubkey,
    ) -> Result<Option<AddressLookupTableAccount>, ClientError> {
        let Some(data) = self.get_account_data(address).await? else {
            return Ok(None);
        };

        let table = AddressLookupTable::deserialize(&data).map_err(|err| {
            ClientError::LookupTableDecode {
                address: *address,
                reason: err.to_string(),
            }
        })?;

        Ok(Some(AddressLookupTableAccount {
            key: *address,
            addresses: table.addresses.to_vec(),
        }))
    }

    async fn simulate_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<SimulationOutcome, ClientError>;

    async fn send_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<Signature, ClientError>;

    async fn send_and_confirm_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<Signature, ClientError>;
}

#[async_trait]
impl ChainClient for RpcClient {
    async fn get_slot(&self) -> Result<u64, ClientError> {
        Ok(RpcClient::get_slot(self).await?)
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, ClientError> {
        Ok(RpcClient::get_latest_blockhash(self).await?)
    }

    async fn get_balance(&self, address: &Pubkey) -> Result<u64, ClientError> {
        Ok(RpcClient::get_balance(self, address).await?)
    }

    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, ClientError> {
        let response = self
            .get_account_with_commitment(address, self.commitment())
            .await?;
        Ok(response.value.map(|account| account.data))
    }

    async fn simulate_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<SimulationOutcome, ClientError> {
        let result = RpcClient::simulate_transaction(self, transaction)
            .await?
            .value;

        Ok(SimulationOutcome {
            err: result.err.map(|err| format!("{err:?}")),
            logs: result.logs.unwrap_or_default(),
            units_consumed: result.units_consumed,
        })
    }

    async fn send_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<Signature, ClientError> {
        Ok(RpcClient::send_transaction(self, transaction).await?)
    }

    async fn send_and_confirm_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<Signature, ClientError> {
        Ok(RpcClient::send_and_confirm_transaction(self, transaction).await?)
    }
}
