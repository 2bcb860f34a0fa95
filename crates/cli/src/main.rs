//! Command-line front end for the softphone shim
//!
//! ```text
//! softphone gen-id --count 3
//! softphone -vv register 1001@pbx.example.com pbx.example.com 1001 secret --ids garbage
//! softphone --json register 1001@pbx pbx 1001 secret --respond 401
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use softphone_infra_common::logging::setup::{log_welcome, parse_log_level};
use softphone_infra_common::{level_from_verbosity, setup_logging, LoggingConfig};

use crate::commands::gen_id::GenIdArgs;
use crate::commands::register::RegisterArgs;

/// Softphone shim tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Explicit log level, overrides -v
    #[arg(long, global = true, env = "SOFTPHONE_LOG")]
    log_level: Option<String>,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate Call-ID style identifiers
    GenId(GenIdArgs),
    /// Run a registration against the in-memory loopback stack
    Register(RegisterArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let level = match cli.log_level.as_deref() {
        Some(level) => parse_log_level(level)?,
        None => level_from_verbosity(2 + u32::from(cli.verbose)),
    };
    setup_logging(LoggingConfig::new(level, "softphone")).context("installing log subscriber")?;
    log_welcome("softphone", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::GenId(args) => commands::gen_id::execute(&args, cli.json),
        Command::Register(args) => commands::register::execute(&args, cli.config.as_deref(), cli.json).await,
    }
}
