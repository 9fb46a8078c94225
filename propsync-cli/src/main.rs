//! propsync: reconcile the AppFolio property roster into Supabase.
//!
//! # Usage
//!
//! ```text
//! propsync sync [--dry-run] [--json]
//! propsync diff [--json]
//! propsync check
//! ```
//!
//! Credentials come from flags, environment variables, or a YAML file
//! (`--config`, default `~/.propsync/config.yaml`).
//!
//! Exit status is 0 only when every write succeeded.

mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{check::CheckArgs, diff::DiffArgs, sync::SyncArgs, GlobalArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "propsync",
    version,
    about = "Sync the active property roster from AppFolio into Supabase",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch both datasets, reconcile, and apply the changes.
    Sync(SyncArgs),

    /// Show the operations a sync would apply, without writing.
    Diff(DiffArgs),

    /// Validate configuration and print the resolved values.
    Check(CheckArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    commands::init_tracing(cli.global.verbose);
    match cli.command {
        Commands::Sync(args) => args.run(&cli.global),
        Commands::Diff(args) => args.run(&cli.global),
        Commands::Check(args) => args.run(&cli.global),
    }
}
