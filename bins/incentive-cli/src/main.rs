//! incentive-cli: Offline quoting and replay for the peg incentive controller.
//!
//! Loads a deployment file (TOML/JSON/YAML, with `INCENTIVE_*` environment
//! overrides) and either prices a single trade, replays a file of trades
//! against an in-memory ledger, or prints the effective configuration.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use incentive_core::amount::{format_units, parse_units};
use incentive_core::config::{DeploymentParams, IncentiveConfig};
use incentive_core::ledger::{BalanceEntry, MemoryLedger};
use incentive_core::traits::{ManualClock, TokenLedger};
use incentive_core::types::{Address, IncentiveOutcome, TradeContext, TradeKind};
use incentive_engine::{
    classify, compute_penalty, compute_reward, distribute_penalty, EpochBudgetTracker,
    IncentiveController, PenaltyQuote, PenaltySplit, RewardQuote,
};

/// Peg incentive controller tooling.
#[derive(Parser)]
#[command(name = "incentive-cli")]
#[command(version, about = "Quote and replay swap penalties and rewards.")]
struct Cli {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Price one trade against a deployment.
    Quote(QuoteArgs),
    /// Replay a JSON file of timestamped trades and report outcomes.
    Simulate(SimulateArgs),
    /// Print the validated deployment and engine configuration.
    ShowConfig(DeploymentArg),
}

#[derive(Args)]
struct DeploymentArg {
    /// Deployment parameters file.
    #[arg(short, long)]
    deployment: PathBuf,
}

#[derive(Args)]
struct QuoteArgs {
    #[command(flatten)]
    deployment: DeploymentArg,

    /// Protocol-token reserve of the pair, in tokens (e.g. `1000000`).
    #[arg(long, value_parser = parse_amount)]
    reserve: u128,

    /// Spot price of the protocol token (e.g. `0.6`).
    #[arg(long, value_parser = parse_amount)]
    price: u128,

    /// Protocol tokens sold into the pool.
    #[arg(long, value_parser = parse_amount, default_value = "0")]
    amount_in: u128,

    /// Protocol tokens bought from the pool.
    #[arg(long, value_parser = parse_amount, default_value = "0")]
    amount_out: u128,

    /// Rewards already paid in the current epoch, in incentive tokens.
    #[arg(long, value_parser = parse_amount, default_value = "0")]
    paid: u128,
}

#[derive(Args)]
struct SimulateArgs {
    #[command(flatten)]
    deployment: DeploymentArg,

    /// JSON array of trades, each with an `at` Unix timestamp.
    #[arg(short, long)]
    trades: PathBuf,

    /// JSON array of `{account, balance}` entries seeding the ledger. Every
    /// listed account approves the controller for unlimited spending.
    #[arg(short, long)]
    balances: Option<PathBuf>,
}

fn parse_amount(s: &str) -> Result<u128, String> {
    parse_units(s).map_err(|e| e.to_string())
}

/// A trade as it appears in a simulation file.
#[derive(Deserialize)]
struct TimedTrade {
    at: u64,
    #[serde(flatten)]
    trade: TradeContext,
}

#[derive(Serialize)]
#[serde(untagged)]
enum TradeResult {
    Applied { outcome: IncentiveOutcome },
    Rejected { error: String, kind: String },
}

#[derive(Serialize)]
struct TradeRecord {
    index: usize,
    at: u64,
    #[serde(flatten)]
    result: TradeResult,
}

#[derive(Serialize)]
struct SimulationReport {
    trades: Vec<TradeRecord>,
    epoch: EpochBudgetTracker,
    balances: Vec<BalanceEntry>,
}

#[derive(Serialize)]
#[serde(tag = "path", rename_all = "lowercase")]
enum QuoteReport {
    Penalty {
        #[serde(flatten)]
        quote: PenaltyQuote,
        split: PenaltySplit,
        display: String,
    },
    Reward {
        #[serde(flatten)]
        quote: RewardQuote,
        display: String,
    },
}

#[derive(Serialize)]
struct ConfigReport<'a> {
    deployment: &'a DeploymentParams,
    effective: IncentiveConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_format);

    match cli.command {
        Commands::Quote(args) => quote(args),
        Commands::Simulate(args) => simulate(args),
        Commands::ShowConfig(args) => show_config(args),
    }
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr so stdout stays machine-readable.
    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init(),
    }
}

fn load_deployment(path: &Path) -> Result<DeploymentParams> {
    DeploymentParams::load(path).with_context(|| format!("loading deployment {}", path.display()))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn quote(args: QuoteArgs) -> Result<()> {
    let params = load_deployment(&args.deployment.deployment)?;
    let config = params.incentive_config();
    let trade = TradeContext {
        reserve: args.reserve,
        price: args.price,
        amount_out: args.amount_out,
        amount_in: args.amount_in,
        recipient: Address::ZERO,
    };

    let report = match classify(&trade)? {
        TradeKind::Sell => {
            let quote = compute_penalty(&trade, &config)?;
            let split = distribute_penalty(quote.amount, &config);
            QuoteReport::Penalty {
                display: format_units(quote.amount),
                quote,
                split,
            }
        }
        TradeKind::Buy => {
            let mut budget = EpochBudgetTracker::new(0, params.epoch_duration_secs);
            budget.commit(args.paid);
            let quote = compute_reward(&trade, &config, &budget)?;
            QuoteReport::Reward {
                display: format_units(quote.granted),
                quote,
            }
        }
    };
    print_json(&report)
}

fn simulate(args: SimulateArgs) -> Result<()> {
    let params = load_deployment(&args.deployment.deployment)?;
    let trades: Vec<TimedTrade> = read_json(&args.trades)?;

    let mut ledger = MemoryLedger::new();
    if let Some(path) = &args.balances {
        let entries: Vec<BalanceEntry> = read_json(path)?;
        for entry in entries {
            ledger.mint(entry.account, entry.balance)?;
            if entry.account != params.controller {
                ledger.approve(entry.account, params.controller, u128::MAX);
            }
        }
    }

    let start = trades.first().map(|t| t.at).unwrap_or(0);
    let clock = ManualClock::new(params.epoch_start_time.unwrap_or(start));
    let mut controller = IncentiveController::from_deployment(&params, ledger, clock.clone())
        .context("building controller")?;
    info!(trades = trades.len(), controller = %params.controller, "simulation started");

    let mut records = Vec::with_capacity(trades.len());
    let mut last = 0u64;
    for (index, timed) in trades.iter().enumerate() {
        if timed.at < last {
            bail!("trade {index}: timestamp {} is before previous trade at {last}", timed.at);
        }
        last = timed.at;
        clock.set(timed.at);

        let result = match controller.conduct_checks(&timed.trade) {
            Ok(outcome) => TradeResult::Applied { outcome },
            Err(e) => {
                debug!(index, "trade rejected: {e}");
                TradeResult::Rejected {
                    kind: format!("{:?}", e.kind()),
                    error: e.to_string(),
                }
            }
        };
        records.push(TradeRecord { index, at: timed.at, result });
    }

    info!(
        controller_balance = %format_units(controller.ledger().balance_of(&params.controller)),
        paid_this_epoch = %format_units(controller.epoch().rewards_paid_this_epoch()),
        "simulation finished"
    );
    print_json(&SimulationReport {
        trades: records,
        epoch: controller.epoch().clone(),
        balances: controller.ledger().entries(),
    })
}

fn show_config(args: DeploymentArg) -> Result<()> {
    let params = load_deployment(&args.deployment)?;
    print_json(&ConfigReport {
        effective: params.incentive_config(),
        deployment: &params,
    })
}
