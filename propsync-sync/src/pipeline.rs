//! Shared sync pipeline entrypoint used by every CLI subcommand.
//!
//! Fetch errors propagate with `?` and abort before any write. Write errors
//! are collected in the [`WriteReport`] and surface only through
//! [`SyncOutcome::is_success`].

use serde::Serialize;

use propsync_core::SyncConfig;

use crate::error::FetchError;
use crate::reconcile::{reconcile, ReconcilePlan};
use crate::source::{AppFolioClient, SourceFetcher};
use crate::store::{StoreReader, StoreWriter, SupabaseClient};
use crate::writer::{apply, WriteReport};

/// Combined result of one run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    pub dry_run: bool,
    pub plan: ReconcilePlan,
    pub writes: WriteReport,
}

impl SyncOutcome {
    pub fn errors(&self) -> usize {
        self.writes.errors()
    }

    /// `true` when no write failed.
    pub fn is_success(&self) -> bool {
        self.errors() == 0
    }
}

/// Fetch both datasets and compute the plan without writing anything.
pub fn plan<S, R>(source: &S, store: &R) -> Result<ReconcilePlan, FetchError>
where
    S: SourceFetcher + ?Sized,
    R: StoreReader + ?Sized,
{
    let records = source.fetch_active()?;
    let index = store.fetch_index()?;
    Ok(reconcile(&records, &index))
}

/// Fetch, reconcile, and apply.
pub fn run<S, R, W>(
    source: &S,
    reader: &R,
    writer: &W,
    dry_run: bool,
) -> Result<SyncOutcome, FetchError>
where
    S: SourceFetcher + ?Sized,
    R: StoreReader + ?Sized,
    W: StoreWriter + ?Sized,
{
    let plan = plan(source, reader)?;
    let writes = apply(writer, &plan, dry_run);
    Ok(SyncOutcome {
        dry_run,
        plan,
        writes,
    })
}

/// HTTP clients built from a validated configuration.
pub struct Clients {
    pub source: AppFolioClient,
    pub store: SupabaseClient,
}

impl Clients {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            source: AppFolioClient::new(&config.source),
            store: SupabaseClient::new(&config.store),
        }
    }

    pub fn plan(&self) -> Result<ReconcilePlan, FetchError> {
        plan(&self.source, &self.store)
    }

    pub fn run(&self, dry_run: bool) -> Result<SyncOutcome, FetchError> {
        run(&self.source, &self.store, &self.store, dry_run)
    }
}
