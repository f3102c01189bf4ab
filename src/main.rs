//! Command line entry point
//!
//! Each subcommand runs one scenario: a plain batch buy, a batch buy compacted
//! with a lookup table, lookup table creation, or a size comparison of the two
//! transaction forms. Settings come from flags or the environment (`.env` is
//! loaded when present).

use std::sync::Arc;

use clap::{Parser, Subcommand};
use pumpfun_bundle::{
    common::types::{Cluster, PriorityFee},
    config::{BundlerConfig, KeySet},
    error::ClientError,
    utils::sol_to_lamports,
    BundleOutcome, Bundler,
};
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey, signer::Signer};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Batched Pump.fun buys in one versioned transaction
#[derive(Parser, Debug)]
#[command(name = "pumpfun-bundle")]
#[command(about = "Batched Pump.fun buys, optionally compacted with an address lookup table", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RPC URL, including any access key
    #[arg(long, env = "RPC_URL", default_value = "https://api.mainnet-beta.solana.com")]
    rpc_url: String,

    /// Base-58 secret key of the fee payer and lookup table authority
    #[arg(long, env = "SIGNER_KEY", hide_env_values = true)]
    signer_key: String,

    /// Comma-separated base-58 secret keys of the buyers; the signer buys alone when empty
    #[arg(long, env = "BUYER_KEYS", default_value = "", hide_env_values = true)]
    buyer_keys: String,

    /// Token mint to buy
    #[arg(long, env = "MINT")]
    mint: Pubkey,

    /// Token creator
    #[arg(long, env = "CREATOR")]
    creator: Pubkey,

    /// Existing lookup table for `lookup-buy` and `compare`
    #[arg(long, env = "LOOKUP_TABLE")]
    lookup_table: Option<Pubkey>,

    /// SOL each participant spends
    #[arg(long, env = "SOL_AMOUNT", default_value = "0.0001")]
    sol_amount: f64,

    /// Slippage tolerance in basis points
    #[arg(long, env = "SLIPPAGE_BPS", default_value = "100")]
    slippage_bps: u64,

    /// Compute unit limit for buy transactions
    #[arg(long, env = "PRIORITY_UNIT_LIMIT")]
    unit_limit: Option<u32>,

    /// Compute unit price for buy transactions, in micro-lamports
    #[arg(long, env = "PRIORITY_UNIT_PRICE")]
    unit_price: Option<u64>,

    /// Build and report without sending anything
    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Batch buy without a lookup table
    BundleBuy,
    /// Batch buy compacted with LOOKUP_TABLE
    LookupBuy,
    /// Create a lookup table holding every address of the batch
    CreateLookupTable,
    /// Compare transaction sizes with and without LOOKUP_TABLE
    Compare,
}

impl Cli {
    fn bundler_config(&self) -> BundlerConfig {
        let cluster = Cluster::new(
            self.rpc_url.clone(),
            CommitmentConfig::confirmed(),
            PriorityFee::new(self.unit_limit, self.unit_price),
        );

        let mut config = BundlerConfig::new(
            cluster,
            self.mint,
            self.creator,
            sol_to_lamports(self.sol_amount),
        );
        config.lookup_table = self.lookup_table;
        config.slippage_basis_points = self.slippage_bps;
        config
    }
}

fn required_table(config: &BundlerConfig) -> Result<Pubkey, ClientError> {
    config
        .lookup_table
        .ok_or_else(|| ClientError::ConfigError("LOOKUP_TABLE is not set".to_string()))
}

fn print_outcome(outcome: &BundleOutcome) {
    println!("Transaction size:   {} bytes", outcome.compiled.size);
    println!("Instructions:       {}", outcome.compiled.instruction_count);
    println!("Signers:            {}", outcome.compiled.signer_count);
    println!(
        "Table addresses:    {}",
        outcome.compiled.lookup_address_count()
    );
    println!(
        "Participants:       {} included, {} skipped",
        outcome.assembled.included_count(),
        outcome.assembled.skipped_count()
    );
    if !outcome.missing_from_table.is_empty() {
        println!(
            "Not in table:       {} addresses kept inline",
            outcome.missing_from_table.len()
        );
    }
    for (participant, reason) in outcome.assembled.skipped() {
        println!("  skipped {participant}: {reason}");
    }
    match outcome.signature {
        Some(signature) => println!("Signature:          {signature}"),
        None => println!("Not submitted (dry run)"),
    }
}

async fn run(cli: Cli) -> Result<(), ClientError> {
    let config = cli.bundler_config();
    let keys = KeySet::from_base58(&cli.signer_key, &cli.buyer_keys)?;
    let participants = keys.participants();
    let submit = !cli.dry_run;

    info!(
        payer = %keys.signer.pubkey(),
        participants = participants.len(),
        mint = %config.mint,
        "starting"
    );

    let bundler = Bundler::new(Arc::clone(&keys.signer), config);

    match cli.command {
        Command::BundleBuy => {
            let outcome = bundler.bundle_buy(&participants, None, submit).await?;
            print_outcome(&outcome);
        }
        Command::LookupBuy => {
            let table = required_table(&bundler.config)?;
            let outcome = bundler
                .bundle_buy(&participants, Some(table), submit)
                .await?;
            print_outcome(&outcome);
        }
        Command::CreateLookupTable => {
            bundler.participant_balances(&participants).await?;

            if cli.dry_run {
                let catalog = bundler.catalog(&participants).await?;
                catalog.ensure_fits_table()?;
                println!("Lookup table would hold {} addresses", catalog.len());
                for address in catalog.iter() {
                    println!("  {address}");
                }
            } else {
                let table = bundler.prepare_lookup_table(&participants).await?;
                println!("Lookup table: {table}");
            }
        }
        Command::Compare => {
            let table = required_table(&bundler.config)?;
            let comparison = bundler.compare_sizes(&participants, table).await?;
            println!("{comparison}");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        error!(error = %err, "run failed");
        for line in err.simulation_logs().unwrap_or_default() {
            eprintln!("  {line}");
        }
        return Err(err.into());
    }

    Ok(())
}
