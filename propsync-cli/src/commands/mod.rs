//! Subcommands and the arguments they share.

pub mod check;
pub mod diff;
pub mod sync;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use propsync_core::config::{
    self, ConfigLayer, APPFOLIO_BASE_URL, APPFOLIO_CLIENT_ID, APPFOLIO_CLIENT_SECRET,
    SOURCE_TIMEOUT_SECS, SUPABASE_SERVICE_KEY, SUPABASE_URL,
};
use propsync_core::{ConfigError, SyncConfig};

/// Options accepted by every subcommand. Each value falls back to its
/// environment variable, then to the config file.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// YAML config file (default: ~/.propsync/config.yaml when present).
    #[arg(long, global = true, env = "PROPSYNC_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// AppFolio API client id.
    #[arg(long, global = true, env = APPFOLIO_CLIENT_ID, hide_env_values = true)]
    pub appfolio_client_id: Option<String>,

    /// AppFolio API client secret.
    #[arg(long, global = true, env = APPFOLIO_CLIENT_SECRET, hide_env_values = true)]
    pub appfolio_client_secret: Option<String>,

    /// AppFolio tenant URL, e.g. https://example.appfolio.com
    #[arg(long, global = true, env = APPFOLIO_BASE_URL, value_name = "URL")]
    pub appfolio_base_url: Option<String>,

    /// Supabase project URL.
    #[arg(long, global = true, env = SUPABASE_URL, value_name = "URL")]
    pub supabase_url: Option<String>,

    /// Supabase service-role key.
    #[arg(long, global = true, env = SUPABASE_SERVICE_KEY, hide_env_values = true)]
    pub supabase_service_key: Option<String>,

    /// Timeout for the AppFolio request, in seconds.
    #[arg(long, global = true, env = SOURCE_TIMEOUT_SECS, value_name = "SECS")]
    pub source_timeout_secs: Option<String>,

    /// Log at debug level (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    fn layer(&self) -> Result<ConfigLayer, ConfigError> {
        let source_timeout_secs = self
            .source_timeout_secs
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .map(config::parse_timeout_secs)
            .transpose()?;
        Ok(ConfigLayer {
            appfolio_client_id: self.appfolio_client_id.clone(),
            appfolio_client_secret: self.appfolio_client_secret.clone(),
            appfolio_base_url: self.appfolio_base_url.clone(),
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            source_timeout_secs,
        })
    }

    /// Resolve and validate the run configuration.
    pub fn load_config(&self) -> Result<SyncConfig> {
        self.layer()
            .and_then(|layer| config::resolve(self.config.as_deref(), layer))
            .context("invalid configuration")
    }
}

/// Install the stderr log subscriber. Stdout is reserved for reports.
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Filter used when `RUST_LOG` is unset.
fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}
