//! Batch instruction assembly
//!
//! Quotes a purchase once, builds every participant's buy instructions
//! concurrently, and joins them into one ordered instruction list. What
//! happens to participants whose instructions cannot be built is decided by
//! [`PartialFailurePolicy`].

use std::{ops::Range, sync::Arc};

use async_trait::async_trait;
use futures::future::join_all;
use solana_sdk::{instruction::Instruction, pubkey::Pubkey};
#[cfg(feature = "create-ata")]
use spl_associated_token_account::instruction::create_associated_token_account_idempotent;
use tracing::{debug, info, warn};

use crate::{
    accounts::{self, get_bonding_curve_pda, get_global_pda},
    common::{
        chain::ChainClient,
        types::{Participant, PriorityFee, PurchaseIntent},
    },
    error::ClientError,
    instructions,
    utils::{calculate_with_slippage_buy, get_priority_fee_instructions},
};

/// Price estimate shared by every buy in a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    /// Tokens each participant's SOL buys, in smallest units
    pub token_amount: u64,
    pub fee_recipient: Pubkey,
    pub creator: Pubkey,
}

/// Prices purchases and builds per-participant buy instructions
#[async_trait]
pub trait BuyInstructionSource: Send + Sync {
    async fn quote(&self, mint: &Pubkey, amount_sol: u64) -> Result<Quote, ClientError>;

    /// Instructions `participant` signs to execute `intent` at `quote`
    async fn buy_instructions(
        &self,
        participant: &Participant,
        quote: &Quote,
        intent: &PurchaseIntent,
    ) -> Result<Vec<Instruction>, ClientError>;
}

/// Instruction source backed by the Pump.fun program accounts
pub struct PumpFunSource {
    chain: Arc<dyn ChainClient>,
    /// Creator used while the mint has no bonding curve yet
    creator: Pubkey,
}

impl PumpFunSource {
    pub fn new(chain: Arc<dyn ChainClient>, creator: Pubkey) -> Self {
        Self { chain, creator }
    }

    /// Fetches and decodes the program's global account
    pub async fn get_global_account(&self) -> Result<accounts::GlobalAccount, ClientError> {
        let global = get_global_pda();

        let data = self
            .chain
            .get_account_data(&global)
            .await?
            .ok_or(ClientError::AccountNotFound(global))?;

        solana_sdk::borsh1::try_from_slice_unchecked::<accounts::GlobalAccount>(&data)
            .map_err(ClientError::BorshError)
    }

    /// Fetches a mint's bonding curve, `None` if it does not exist yet
    pub async fn get_bonding_curve_account(
        &self,
        mint: &Pubkey,
    ) -> Result<Option<accounts::BondingCurveAccount>, ClientError> {
        let bonding_curve = get_bonding_curve_pda(mint);

        let Some(data) = self.chain.get_account_data(&bonding_curve).await? else {
            return Ok(None);
        };

        solana_sdk::borsh1::try_from_slice_unchecked::<accounts::BondingCurveAccount>(&data)
            .map(Some)
            .map_err(ClientError::BorshError)
    }
}

#[async_trait]
impl BuyInstructionSource for PumpFunSource {
    async fn quote(&self, mint: &Pubkey, amount_sol: u64) -> Result<Quote, ClientError> {
        let global = self.get_global_account().await?;

        let (token_amount, creator) = match self.get_bonding_curve_account(mint).await? {
            Some(curve) => (
                curve
                    .get_buy_price(amount_sol)
                    .map_err(ClientError::BondingCurveError)?,
                curve.creator,
            ),
            None => (global.get_initial_buy_price(amount_sol), self.creator),
        };

        debug!(%mint, amount_sol, token_amount, %creator, "quoted buy");
        Ok(Quote {
            token_amount,
            fee_recipient: global.fee_recipient,
            creator,
        })
    }

    async fn buy_instructions(
        &self,
        participant: &Participant,
        quote: &Quote,
        intent: &PurchaseIntent,
    ) -> Result<Vec<Instruction>, ClientError> {
        let owner = participant.pubkey();
        let max_sol_cost =
            calculate_with_slippage_buy(intent.amount_sol, intent.slippage_basis_points);

        let balance = self.chain.get_balance(&owner).await?;
        if balance < max_sol_cost {
            return Err(ClientError::InsufficientBalance {
                owner,
                balance,
                required: max_sol_cost,
            });
        }

        let mut instructions = Vec::with_capacity(2);

        #[cfg(feature = "create-ata")]
        instructions.push(create_associated_token_account_idempotent(
            &owner,
            &owner,
            &intent.mint,
            &crate::constants::accounts::TOKEN_PROGRAM,
        ));

        instructions.push(instructions::buy(
            &owner,
            &intent.mint,
            &quote.fee_recipient,
            &quote.creator,
            instructions::Buy {
                amount: quote.token_amount,
                max_sol_cost,
                track_volume: intent.track_volume,
            },
        )?);

        Ok(instructions)
    }
}

/// What to do when one participant's instructions cannot be built
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PartialFailurePolicy {
    /// Drop the participant and continue with the rest
    #[default]
    SkipFailed,
    /// Fail the whole batch
    AbortBatch,
}

/// Per-participant result of assembly
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipantOutcome {
    Included {
        participant: Pubkey,
        /// Position of this participant's group in the batch instruction list
        instructions: Range<usize>,
    },
    Skipped {
        participant: Pubkey,
        reason: String,
    },
}

impl ParticipantOutcome {
    pub fn participant(&self) -> Pubkey {
        match self {
            Self::Included { participant, .. } | Self::Skipped { participant, .. } => *participant,
        }
    }

    pub fn is_included(&self) -> bool {
        matches!(self, Self::Included { .. })
    }
}

/// Instructions for a whole batch plus how each participant fared
#[derive(Debug, Clone)]
pub struct AssembledBatch {
    /// Priority fee instructions, then each included participant's group in order
    pub instructions: Vec<Instruction>,
    /// One entry per participant, in participant order
    pub outcomes: Vec<ParticipantOutcome>,
    pub quote: Quote,
}

impl AssembledBatch {
    pub fn included_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_included()).count()
    }

    /// Keys of the participants whose instructions are in the batch, in order
    pub fn included(&self) -> impl Iterator<Item = Pubkey> + '_ {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.is_included())
            .map(ParticipantOutcome::participant)
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.len() - self.included_count()
    }

    /// Participants left out of the batch, with the reason
    pub fn skipped(&self) -> impl Iterator<Item = (&Pubkey, &str)> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            ParticipantOutcome::Skipped {
                participant,
                reason,
            } => Some((participant, reason.as_str())),
            ParticipantOutcome::Included { .. } => None,
        })
    }

    /// The instruction group of an included participant
    pub fn instructions_for(&self, participant: &Pubkey) -> Option<&[Instruction]> {
        self.outcomes.iter().find_map(|outcome| match outcome {
            ParticipantOutcome::Included {
                participant: p,
                instructions,
            } if p == participant => Some(&self.instructions[instructions.clone()]),
            _ => None,
        })
    }
}

/// Builds the instruction list of a batch buy
pub struct InstructionAssembler {
    source: Arc<dyn BuyInstructionSource>,
    policy: PartialFailurePolicy,
    priority_fee: PriorityFee,
}

impl InstructionAssembler {
    pub fn new(
        source: Arc<dyn BuyInstructionSource>,
        policy: PartialFailurePolicy,
        priority_fee: PriorityFee,
    ) -> Self {
        Self {
            source,
            policy,
            priority_fee,
        }
    }

    /// Assembles one batch from `participants` buying `intent`
    ///
    /// Participant instructions are built concurrently but land in the list
    /// in participant order.
    ///
    /// # Errors
    ///
    /// - The quote fails
    /// - A participant fails under [`PartialFailurePolicy::AbortBatch`]
    /// - No participant was included
    pub async fn assemble(
        &self,
        participants: &[Participant],
        intent: &PurchaseIntent,
    ) -> Result<AssembledBatch, ClientError> {
        let quote = self.source.quote(&intent.mint, intent.amount_sol).await?;

        let results = join_all(
            participants
                .iter()
                .map(|participant| self.source.buy_instructions(participant, &quote, intent)),
        )
        .await;

        let mut instructions = get_priority_fee_instructions(&self.priority_fee);
        let mut outcomes = Vec::with_capacity(participants.len());

        for (participant, result) in participants.iter().zip(results) {
            let participant = participant.pubkey();
            match result {
                Ok(group) => {
                    let start = instructions.len();
                    instructions.extend(group);
                    outcomes.push(ParticipantOutcome::Included {
                        participant,
                        instructions: start..instructions.len(),
                    });
                }
                Err(err) => match self.policy {
                    PartialFailurePolicy::AbortBatch => {
                        return Err(ClientError::ParticipantFailed {
                            participant,
                            reason: err.to_string(),
                        });
                    }
                    PartialFailurePolicy::SkipFailed => {
                        warn!(%participant, error = %err, "skipping participant");
                        outcomes.push(ParticipantOutcome::Skipped {
                            participant,
                            reason: err.to_string(),
                        });
                    }
                },
            }
        }

        let batch = AssembledBatch {
            instructions,
            outcomes,
            quote,
        };

        if batch.included_count() == 0 {
            return Err(ClientError::EmptyBatch);
        }

        info!(
            included = batch.included_count(),
            skipped = batch.skipped_count(),
            instructions = batch.instructions.len(),
            "assembled batch"
        );
        Ok(batch)
    }
}
