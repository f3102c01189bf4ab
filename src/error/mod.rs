//! Error types for the bundler.
//!
//! `ClientError` covers every failure the library surfaces: RPC and decoding
//! failures, lookup table lifecycle failures, capacity violations detected
//! before submission, signing problems, and rejected simulations.

use solana_sdk::pubkey::Pubkey;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Error related to bonding curve operations
    #[error("Bonding curve error: {0}")]
    BondingCurveError(&'static str),
    /// Error deserializing account data using Borsh
    #[error("Borsh serialization error: {0}")]
    BorshError(#[from] std::io::Error),
    /// Error from the Solana RPC client
    #[error("Solana client error: {0}")]
    SolanaClientError(#[from] solana_client::client_error::ClientError),
    #[error("Account not found: {0}")]
    AccountNotFound(Pubkey),
    #[error("Lookup table not found: {0}")]
    LookupTableNotFound(Pubkey),
    #[error("Lookup table {address} could not be decoded: {reason}")]
    LookupTableDecode { address: Pubkey, reason: String },
    /// Creation gave up; `last` is the error of the final attempt
    #[error("Failed to create lookup table after {attempts} attempts: {last}")]
    LookupTableCreationFailed {
        attempts: usize,
        #[source]
        last: Box<ClientError>,
    },
    /// More addresses than one lookup table can hold
    #[error("Address catalog holds {len} addresses, lookup table capacity is {capacity}")]
    CatalogTooLarge { len: usize, capacity: usize },
    #[error("Transaction is {size} bytes, limit is {limit}")]
    TransactionTooLarge { size: usize, limit: usize },
    #[error("Failed to compile transaction message: {0}")]
    CompileError(String),
    #[error("Failed to sign transaction: {0}")]
    SigningError(String),
    /// A signature required by the message has no matching keypair
    #[error("Missing signer for {0}")]
    MissingSigner(Pubkey),
    #[error("Failed to serialize transaction: {0}")]
    SerializationError(#[from] bincode::Error),
    #[error("Simulation failed: {err}")]
    SimulationFailed { err: String, logs: Vec<String> },
    /// A participant's instructions could not be built and the batch aborts
    #[error("Failed to build instructions for participant {participant}: {reason}")]
    ParticipantFailed { participant: Pubkey, reason: String },
    /// A participant cannot cover its buy
    #[error("Participant {owner} holds {balance} lamports, buy needs {required}")]
    InsufficientBalance {
        owner: Pubkey,
        balance: u64,
        required: u64,
    },
    /// No participant contributed instructions
    #[error("Batch has no instructions")]
    EmptyBatch,
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Other error
    #[error("Other error: {0}")]
    OtherError(String),
}

impl ClientError {
    /// Whether a fresh attempt could succeed where this one failed
    ///
    /// Rejected simulations (a slot that is no longer recent) and transport
    /// failures qualify. Local size, signing and capacity errors do not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::SimulationFailed { .. } | ClientError::SolanaClientError(_)
        )
    }

    /// Program logs of the simulation behind this error, if any
    pub fn simulation_logs(&self) -> Option<&[String]> {
        match self {
            ClientError::SimulationFailed { logs, .. } => Some(logs),
            ClientError::LookupTableCreationFailed { last, .. } => last.simulation_logs(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected_slot() -> ClientError {
        ClientError::SimulationFailed {
            err: "InstructionError(2, InvalidInstructionData)".to_string(),
            logs: vec!["1001 is not a recent slot".to_string()],
        }
    }

    #[test]
    fn test_simulation_logs_survive_creation_failure() {
        let err = ClientError::LookupTableCreationFailed {
            attempts: 5,
            last: Box::new(rejected_slot()),
        };

        assert_eq!(
            err.simulation_logs(),
            Some(&["1001 is not a recent slot".to_string()][..])
        );
        assert!(err.to_string().contains("after 5 attempts"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(ClientError::EmptyBatch.simulation_logs().is_none());
    }

    #[test]
    fn test_retryable_errors() {
        assert!(rejected_slot().is_retryable());
        assert!(!ClientError::TransactionTooLarge {
            size: 1300,
            limit: 1232
        }
        .is_retryable());
        assert!(!ClientError::MissingSigner(Pubkey::new_unique()).is_retryable());
        assert!(!ClientError::OtherError("insufficient funds for rent".to_string()).is_retryable());
    }
}
