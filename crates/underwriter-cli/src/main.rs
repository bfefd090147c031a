//! `underwriter` command line.
//!
//! Usage: underwriter <command>

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod telemetry;

#[derive(Parser, Debug)]
#[command(name = "underwriter")]
#[command(about = "Evaluate insurance risk profiles and manage underwriting rule sets", version)]
struct Cli {
    /// Log filter when RUST_LOG is unset (e.g. info, underwriter::audit=info)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full underwriting pipeline over a profile
    Evaluate(EvaluateArgs),

    /// Print the risk score breakdown for a profile
    Score {
        /// Profile file (.yaml, .yml or .json)
        profile: PathBuf,
    },

    /// Validate or inspect rule sets
    Rules {
        #[command(subcommand)]
        command: RulesCommand,
    },
}

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Profile file (.yaml, .yml or .json)
    pub(crate) profile: PathBuf,

    /// Runtime configuration file
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,

    /// Rule set overriding the configured one
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,

    /// Print the full decision as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Subcommand, Debug)]
enum RulesCommand {
    /// Check a rule set file and report its rules
    Validate {
        file: PathBuf,
    },

    /// List rules in execution order
    List {
        /// Rule set file; the embedded standard rules when omitted
        #[arg(long)]
        rules: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(&cli.log_level)?;

    match cli.command {
        Command::Evaluate(args) => commands::evaluate(args).await,
        Command::Score { profile } => commands::score(&profile),
        Command::Rules {
            command: RulesCommand::Validate { file },
        } => commands::validate_rules(&file),
        Command::Rules {
            command: RulesCommand::List { rules },
        } => commands::list_rules(rules.as_deref()),
    }
}
