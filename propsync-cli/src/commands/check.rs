//! `propsync check`: validate configuration without touching the network.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::GlobalArgs;

/// Arguments for `propsync check`.
#[derive(Args, Debug)]
pub struct CheckArgs {}

impl CheckArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<ExitCode> {
        let config = global.load_config()?;

        println!("{} configuration is complete", "✓".green().bold());
        println!("  appfolio url     {}", config.source.base_url);
        println!("  appfolio id      {}", config.source.client_id);
        println!("  appfolio secret  {}", config.source.client_secret.masked());
        println!("  source timeout   {}s", config.source.timeout.as_secs());
        println!("  supabase url     {}", config.store.url);
        println!("  supabase key     {}", config.store.service_key.masked());
        Ok(ExitCode::SUCCESS)
    }
}
