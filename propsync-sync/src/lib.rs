//! # propsync-sync
//!
//! Source and store HTTP clients, the reconciler, and the best-effort writer.
//!
//! Call [`pipeline::run`] with any [`SourceFetcher`], [`StoreReader`] and
//! [`StoreWriter`], or build the real clients with [`pipeline::Clients`].

pub mod error;
pub mod pipeline;
pub mod reconcile;
pub mod source;
pub mod store;
pub mod writer;

pub use error::{FetchError, HttpError, WriteError};
pub use pipeline::{Clients, SyncOutcome};
pub use reconcile::{reconcile, ReconcilePlan, ReconcileSummary};
pub use source::{AppFolioClient, SourceFetcher};
pub use store::{StoreIndex, StoreReader, StoreWriter, SupabaseClient};
pub use writer::{apply, WriteFailure, WriteReport, WriteResult};
