use std::{sync::Arc, time::Duration};

use pumpfun_bundle::{
    accounts::{get_bonding_curve_pda, get_global_pda, BondingCurveAccount, GlobalAccount},
    common::types::{Cluster, Participant, PriorityFee},
    config::BundlerConfig,
    lookup_table::{LookupTableManager, RetryPolicy},
    utils::LAMPORTS_PER_SOL,
    Bundler,
};
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey, signature::Keypair};

use super::MockChain;

/// SOL each participant spends in the scenarios, 0.0001 SOL
pub const AMOUNT_SOL: u64 = 100_000;

pub fn global_account(fee_recipient: Pubkey) -> GlobalAccount {
    GlobalAccount {
        discriminator: 1,
        initialized: true,
        authority: Pubkey::new_unique(),
        fee_recipient,
        initial_virtual_token_reserves: 1_073_000_000_000_000,
        initial_virtual_sol_reserves: 30_000_000_000,
        initial_real_token_reserves: 793_100_000_000_000,
        token_total_supply: 1_000_000_000_000_000,
        fee_basis_points: 95,
        withdraw_authority: Pubkey::new_unique(),
        enable_migrate: true,
        pool_migration_fee: 15_000_001,
        creator_fee_basis_points: 5,
        fee_recipients: [fee_recipient; 7],
        set_creator_authority: Pubkey::new_unique(),
    }
}

pub fn bonding_curve_account(creator: Pubkey) -> BondingCurveAccount {
    BondingCurveAccount {
        discriminator: 1,
        virtual_token_reserves: 1_000_000_000_000_000,
        virtual_sol_reserves: 32_000_000_000,
        real_token_reserves: 720_000_000_000_000,
        real_sol_reserves: 2_000_000_000,
        token_total_supply: 1_000_000_000_000_000,
        complete: false,
        creator,
    }
}

/// A funded payer, a token with a live bonding curve and a mock chain holding both
pub struct TestContext {
    pub chain: Arc<MockChain>,
    pub payer: Arc<Keypair>,
    pub mint: Pubkey,
    pub creator: Pubkey,
    pub fee_recipient: Pubkey,
}

impl Default for TestContext {
    fn default() -> Self {
        let chain = Arc::new(MockChain::new());
        let payer = Arc::new(Keypair::new());
        let mint = Pubkey::new_unique();
        let creator = Pubkey::new_unique();
        let fee_recipient = Pubkey::new_unique();

        chain.set_account(
            get_global_pda(),
            borsh::to_vec(&global_account(fee_recipient)).unwrap(),
        );
        chain.set_account(
            get_bonding_curve_pda(&mint),
            borsh::to_vec(&bonding_curve_account(creator)).unwrap(),
        );

        let ctx = Self {
            chain,
            payer,
            mint,
            creator,
            fee_recipient,
        };
        ctx.fund(&ctx.payer_participant());
        ctx
    }
}

impl TestContext {
    pub fn config(&self) -> BundlerConfig {
        let mut config = BundlerConfig::new(
            Cluster::localnet(CommitmentConfig::confirmed(), PriorityFee::default()),
            self.mint,
            self.creator,
            AMOUNT_SOL,
        );
        config.retry = RetryPolicy::fixed(5, Duration::ZERO);
        config.settle_delay = Duration::ZERO;
        config
    }

    pub fn bundler(&self) -> Bundler {
        self.bundler_with(self.config())
    }

    pub fn bundler_with(&self, config: BundlerConfig) -> Bundler {
        Bundler::with_chain(self.payer.clone(), self.chain.clone(), config)
    }

    pub fn manager(&self) -> LookupTableManager {
        LookupTableManager::from_config(self.chain.clone(), self.payer.clone(), &self.config())
    }

    pub fn payer_participant(&self) -> Participant {
        Participant::new(self.payer.clone())
    }

    pub fn fund(&self, participant: &Participant) {
        self.chain.set_balance(participant.pubkey(), LAMPORTS_PER_SOL);
    }

    /// `count` funded buyers other than the payer
    pub fn buyers(&self, count: usize) -> Vec<Participant> {
        (0..count)
            .map(|_| {
                let participant = Participant::from(Keypair::new());
                self.fund(&participant);
                participant
            })
            .collect()
    }

    /// The payer followed by `extra` funded buyers
    pub fn participants(&self, extra: usize) -> Vec<Participant> {
        let mut participants = vec![self.payer_participant()];
        participants.extend(self.buyers(extra));
        participants
    }
}
