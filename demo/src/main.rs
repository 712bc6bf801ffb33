//! podguard transfer safeguards demo CLI
//!
//! Runs the safeguard scenarios against an in-memory platform, prints the
//! agent tool catalog, calls a single tool, or tails an audit log.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- staged-transfer --data-dir /tmp/pg
//!   cargo run -p demo -- tools
//!   cargo run -p demo -- call --tool get_pod_balance --input '{"pod_name": "rent"}'
//!   cargo run -p demo -- audit-tail --path /tmp/pg/.audit.jsonl -n 5

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use podguard_audit::JsonlAuditLog;
use podguard_contracts::{
    actor::Actor,
    error::{GuardError, GuardResult},
};
use podguard_core::{GuardConfig, SystemClock};
use podguard_sim::{
    scenarios::{
        account_resolution, daily_limit, direct_transfer, expiry_and_ownership, message_rate_limit,
        staged_transfer,
    },
    MockPlatform, Runtime,
};
use podguard_tools::catalog;

// ── CLI definition ────────────────────────────────────────────────────────────

/// podguard: safeguards between an AI agent and a money-moving platform.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "podguard transfer safeguards demo",
    long_about = "Runs podguard scenarios showing staged transfers, daily limits,\n\
                  account resolution, expiry, ownership and the audit trail."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every scenario in sequence.
    RunAll {
        /// Keep state files here instead of a throwaway directory.
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Scenario 1: stage, confirm, record, audit.
    StagedTransfer {
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Scenario 2: per-actor daily ceiling and legacy file migration.
    DailyLimit {
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Scenario 3: exact, substring, ambiguous and unknown account names.
    AccountResolution,
    /// Scenario 4: TTL expiry and ownership checks.
    ExpiryAndOwnership {
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Scenario 5: the one-shot transfer path and platform failures.
    DirectTransfer {
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Scenario 6: per-actor message rate limiting.
    RateLimit {
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Print the agent tool catalog as JSON.
    Tools,
    /// Call one tool against the sample platform and print the reply.
    Call {
        /// Tool name, e.g. get_all_pods.
        #[arg(long)]
        tool: String,
        /// Tool input as a JSON object.
        #[arg(long, default_value = "{}")]
        input: String,
        /// TOML configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Overrides storage.data_dir from the config and environment.
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Actor id the call is made on behalf of.
        #[arg(long, default_value = "operator")]
        actor: String,
    },
    /// Print the last events of a JSONL audit log.
    AuditTail {
        #[arg(long)]
        path: PathBuf,
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::RunAll { data_dir } => with_data_dir(data_dir, run_all),
        Command::StagedTransfer { data_dir } => with_data_dir(data_dir, staged_transfer::run_scenario),
        Command::DailyLimit { data_dir } => with_data_dir(data_dir, daily_limit::run_scenario),
        Command::AccountResolution => account_resolution::run_scenario(),
        Command::ExpiryAndOwnership { data_dir } => {
            with_data_dir(data_dir, expiry_and_ownership::run_scenario)
        }
        Command::DirectTransfer { data_dir } => with_data_dir(data_dir, direct_transfer::run_scenario),
        Command::RateLimit { data_dir } => with_data_dir(data_dir, message_rate_limit::run_scenario),
        Command::Tools => print_tools(),
        Command::Call { tool, input, config, data_dir, actor } => {
            call_tool(&tool, &input, config.as_deref(), data_dir, &actor)
        }
        Command::AuditTail { path, count } => audit_tail(&path, count),
    };

    if let Err(e) = result {
        eprintln!("Demo error: {}", e);
        std::process::exit(1);
    }
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

/// Run `f` in `data_dir`, or in a temporary directory removed afterwards.
fn with_data_dir(data_dir: Option<PathBuf>, f: impl FnOnce(&Path) -> GuardResult<()>) -> GuardResult<()> {
    match data_dir {
        Some(dir) => f(&dir),
        None => {
            let tmp = tempfile::tempdir().map_err(|e| GuardError::StorageFailed {
                path: std::env::temp_dir().display().to_string(),
                reason: e.to_string(),
            })?;
            info!(data_dir = %tmp.path().display(), "using temporary data directory");
            f(tmp.path())
        }
    }
}

fn run_all(data_dir: &Path) -> GuardResult<()> {
    print_banner();
    // Each scenario gets its own directory so audit trails do not mix.
    staged_transfer::run_scenario(&data_dir.join("staged-transfer"))?;
    daily_limit::run_scenario(&data_dir.join("daily-limit"))?;
    account_resolution::run_scenario()?;
    expiry_and_ownership::run_scenario(&data_dir.join("expiry-and-ownership"))?;
    direct_transfer::run_scenario(&data_dir.join("direct-transfer"))?;
    message_rate_limit::run_scenario(&data_dir.join("rate-limit"))?;
    println!("All scenarios completed successfully.");
    Ok(())
}

// ── Tools ─────────────────────────────────────────────────────────────────────

fn print_tools() -> GuardResult<()> {
    let tools = serde_json::to_string_pretty(&catalog()).map_err(|e| GuardError::ConfigError {
        reason: format!("failed to render tool catalog: {}", e),
    })?;
    println!("{}", tools);
    Ok(())
}

fn call_tool(
    tool: &str,
    input: &str,
    config_path: Option<&Path>,
    data_dir: Option<PathBuf>,
    actor: &str,
) -> GuardResult<()> {
    let mut config = match config_path {
        Some(path) => GuardConfig::from_file(path)?,
        None => GuardConfig::default(),
    };
    config.apply_env();
    if let Some(dir) = data_dir {
        config.storage.data_dir = dir;
    }

    let input: Value = serde_json::from_str(input).map_err(|e| GuardError::InvalidToolInput {
        tool: tool.to_string(),
        reason: e.to_string(),
    })?;

    let runtime = Runtime::build(
        &config,
        Arc::new(MockPlatform::sample()),
        config.throttle(),
        Arc::new(SystemClock),
    )?;
    let turn = runtime.agent_turn(&Actor::new(actor), &[(tool, input)])?;

    for reply in &turn.replies {
        println!("{}", serde_json::to_string_pretty(reply).unwrap_or_else(|_| reply.to_string()));
    }
    if !turn.staged.is_empty() {
        println!();
        println!("Staged (awaiting confirmation): {}", turn.staged.join(", "));
    }
    Ok(())
}

fn audit_tail(path: &Path, count: usize) -> GuardResult<()> {
    for event in JsonlAuditLog::new(path).tail(count)? {
        let line = serde_json::to_string(&event).map_err(|e| GuardError::AuditWriteFailed {
            reason: e.to_string(),
        })?;
        println!("{}", line);
    }
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("podguard: Transfer Safeguards");
    println!("Reference Demo");
    println!("==============================");
    println!();
    println!("Every agent-requested transfer passes through:");
    println!("  [1] Note length and amount validation, per-transfer cap");
    println!("  [2] Daily cumulative limit for the requesting actor");
    println!("  [3] Account resolution: exact name, else a unique substring");
    println!("  [4] Live balance check, then an audit record: STAGED");
    println!("  [5] Human confirm (owner only, within the TTL) → execute → record → audit");
    println!();
}
