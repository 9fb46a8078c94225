//! `propsync sync`: reconcile and apply.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use propsync_sync::{Clients, SyncOutcome};

use super::GlobalArgs;

/// Arguments for `propsync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Compute and log the operations without sending any write.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit the outcome as JSON on stdout.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<ExitCode> {
        let config = global.load_config()?;
        tracing::info!("starting AppFolio property sync");

        let outcome = Clients::new(&config)
            .run(self.dry_run)
            .context("sync aborted before any write")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&outcome).context("failed to serialize outcome")?
            );
        } else {
            print_summary(&outcome);
        }

        if outcome.is_success() {
            tracing::info!("sync completed");
            Ok(ExitCode::SUCCESS)
        } else {
            tracing::error!("sync completed with {} failed writes", outcome.errors());
            Ok(ExitCode::FAILURE)
        }
    }
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "properties")]
    label: &'static str,
    #[tabled(rename = "count")]
    count: usize,
}

fn print_summary(outcome: &SyncOutcome) {
    let plan = &outcome.plan.summary;
    let writes = &outcome.writes;
    let prefix = if outcome.dry_run { "[dry-run] " } else { "" };

    let rows = if outcome.dry_run {
        vec![
            SummaryRow {
                label: "would add",
                count: plan.to_insert,
            },
            SummaryRow {
                label: "would reactivate",
                count: plan.to_reactivate,
            },
            SummaryRow {
                label: "would deactivate",
                count: plan.to_deactivate,
            },
            SummaryRow {
                label: "unchanged",
                count: plan.unchanged,
            },
            SummaryRow {
                label: "skipped",
                count: plan.skipped,
            },
        ]
    } else {
        vec![
            SummaryRow {
                label: "added",
                count: writes.added,
            },
            SummaryRow {
                label: "reactivated",
                count: writes.reactivated,
            },
            SummaryRow {
                label: "deactivated",
                count: writes.deactivated,
            },
            SummaryRow {
                label: "unchanged",
                count: plan.unchanged,
            },
            SummaryRow {
                label: "skipped",
                count: plan.skipped,
            },
            SummaryRow {
                label: "errors",
                count: writes.errors(),
            },
        ]
    };

    let mut table = Table::new(rows);
    table.with(Style::rounded());

    let headline = format!(
        "{prefix}sync summary ({} source records, {} store rows)",
        plan.source_records, plan.store_rows
    );
    if outcome.is_success() {
        println!("{} {headline}", "✓".green().bold());
    } else {
        println!("{} {headline}", "✗".red().bold());
    }
    println!("{table}");

    for failure in &writes.failures {
        println!("  {}  {}", "!".red(), failure.message);
    }
}
