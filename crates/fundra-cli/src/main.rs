// SPDX-License-Identifier: BUSL-1.1
//! # fundra CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fundra_cli::run::{run_once, RunArgs};
use fundra_cli::watch::{run_watch, WatchArgs};

/// Fundra escrow engine CLI.
///
/// Evaluates a project's automated escrow release rules against the
/// platform record store — once, or on an interval.
#[derive(Parser, Debug)]
#[command(name = "fundra", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a project's active rules once and print the outcomes.
    Run(RunArgs),

    /// Re-evaluate projects on an interval until interrupted.
    Watch(WatchArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Run(args) => run_once(args).await,
        Commands::Watch(args) => run_watch(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
