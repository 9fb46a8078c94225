//! Best-effort application of a [`ReconcilePlan`] to the store.
//!
//! Each operation is sent on its own. A failed call is logged and recorded
//! in the [`WriteReport`]; the remaining operations still run. Nothing is
//! retried.

use serde::Serialize;

use propsync_core::{Operation, OperationKind};

use crate::reconcile::ReconcilePlan;
use crate::store::StoreWriter;

// ---------------------------------------------------------------------------
// Write result
// ---------------------------------------------------------------------------

/// Outcome of an individual operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// The store accepted the operation.
    Applied { operation: Operation },
    /// `--dry-run` mode: the operation *would* have been sent.
    WouldApply { operation: Operation },
    /// The store rejected the operation or could not be reached.
    Failed {
        operation: Operation,
        message: String,
    },
}

/// A failed operation and the error it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteFailure {
    pub operation: Operation,
    pub message: String,
}

/// Immutable totals for one batch of writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub added: usize,
    pub reactivated: usize,
    pub deactivated: usize,
    /// Operations skipped because of `--dry-run`.
    pub would_apply: usize,
    pub failures: Vec<WriteFailure>,
}

impl WriteReport {
    pub fn errors(&self) -> usize {
        self.failures.len()
    }

    pub fn from_results(results: impl IntoIterator<Item = WriteResult>) -> Self {
        let mut report = WriteReport::default();
        for result in results {
            match result {
                WriteResult::Applied { operation } => match operation.kind() {
                    OperationKind::Insert => report.added += 1,
                    OperationKind::Reactivate => report.reactivated += 1,
                    OperationKind::Deactivate => report.deactivated += 1,
                },
                WriteResult::WouldApply { .. } => report.would_apply += 1,
                WriteResult::Failed { operation, message } => {
                    report.failures.push(WriteFailure { operation, message })
                }
            }
        }
        report
    }
}

// ---------------------------------------------------------------------------
// apply
// ---------------------------------------------------------------------------

/// Send one operation to the store.
pub fn apply_operation<W: StoreWriter + ?Sized>(
    writer: &W,
    operation: &Operation,
    dry_run: bool,
) -> WriteResult {
    if dry_run {
        tracing::info!(
            "[dry-run] would {} property {}",
            operation.kind(),
            operation.external_id()
        );
        return WriteResult::WouldApply {
            operation: operation.clone(),
        };
    }

    let outcome = match operation {
        Operation::Insert {
            external_id,
            display_name,
        } => {
            tracing::info!("adding new property: {display_name} (ID: {external_id})");
            writer.insert(external_id, display_name)
        }
        Operation::SetActive {
            external_id,
            active: true,
        } => {
            tracing::info!("reactivating property (ID: {external_id})");
            writer.set_active(external_id, true)
        }
        Operation::SetActive {
            external_id,
            active: false,
        } => {
            tracing::info!("deactivating property (ID: {external_id})");
            writer.set_active(external_id, false)
        }
    };

    match outcome {
        Ok(()) => WriteResult::Applied {
            operation: operation.clone(),
        },
        Err(err) => {
            tracing::error!("{err}");
            WriteResult::Failed {
                operation: operation.clone(),
                message: err.to_string(),
            }
        }
    }
}

/// Apply every operation of `plan` in order and total the results.
pub fn apply<W: StoreWriter + ?Sized>(
    writer: &W,
    plan: &ReconcilePlan,
    dry_run: bool,
) -> WriteReport {
    WriteReport::from_results(
        plan.operations()
            .iter()
            .map(|operation| apply_operation(writer, operation, dry_run)),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
