//! `propsync diff`: show the operations a sync would apply.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use propsync_core::Operation;
use propsync_sync::{Clients, ReconcilePlan};

use super::GlobalArgs;

/// Arguments for `propsync diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Emit the plan as JSON on stdout.
    #[arg(long)]
    pub json: bool,
}

impl DiffArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<ExitCode> {
        let config = global.load_config()?;
        let plan = Clients::new(&config)
            .plan()
            .context("could not compute plan")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&plan).context("failed to serialize plan")?
            );
        } else {
            print_plan(&plan);
        }
        Ok(ExitCode::SUCCESS)
    }
}

fn print_plan(plan: &ReconcilePlan) {
    let summary = &plan.summary;
    if plan.is_empty() {
        println!(
            "No changes ({} unchanged, {} skipped).",
            summary.unchanged, summary.skipped
        );
        return;
    }

    for op in plan.operations() {
        println!("{}", format_operation(op));
    }
    println!(
        "{} to add, {} to reactivate, {} to deactivate, {} unchanged, {} skipped",
        summary.to_insert,
        summary.to_reactivate,
        summary.to_deactivate,
        summary.unchanged,
        summary.skipped
    );
}

fn format_operation(op: &Operation) -> String {
    match op {
        Operation::Insert {
            external_id,
            display_name,
        } => format!("{} {external_id}  {display_name}", "+".green().bold()),
        Operation::SetActive {
            external_id,
            active: true,
        } => format!("{} {external_id}  reactivate", "↑".yellow().bold()),
        Operation::SetActive {
            external_id,
            active: false,
        } => format!("{} {external_id}  deactivate", "-".red().bold()),
    }
}
