//! Diff of the upstream roster against the store index.
//!
//! ## Rules
//!
//! 1. Upstream records with a blank id or name are skipped (warning) and
//!    treated as absent.
//! 2. For each remaining upstream id, in roster order:
//!    - not in the store → `Insert`
//!    - in the store, inactive → `SetActive(true)`
//!    - in the store, active → unchanged
//! 3. For each store row, in store order, that is active and whose id was
//!    not seen upstream → `SetActive(false)`.
//!
//! Display names of existing rows are never updated.

use std::collections::HashSet;

use serde::Serialize;

use propsync_core::{ExternalId, ExternalRecord, Operation, OperationKind};

use crate::store::StoreIndex;

/// Counts produced by [`reconcile`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    /// Records received from the source, including skipped ones.
    pub source_records: usize,
    /// Store rows that carried an external id.
    pub store_rows: usize,
    pub to_insert: usize,
    pub to_reactivate: usize,
    pub to_deactivate: usize,
    pub unchanged: usize,
    /// Blank or duplicate source records.
    pub skipped: usize,
}

/// Ordered operations needed to bring the store in line with the source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcilePlan {
    operations: Vec<Operation>,
    pub summary: ReconcileSummary,
}

impl ReconcilePlan {
    /// Inserts and reactivations in roster order, then deactivations in
    /// store order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// `(external_id, display_name)` of every planned insert.
    pub fn inserts(&self) -> impl Iterator<Item = (&ExternalId, &str)> {
        self.operations.iter().filter_map(|op| match op {
            Operation::Insert {
                external_id,
                display_name,
            } => Some((external_id, display_name.as_str())),
            Operation::SetActive { .. } => None,
        })
    }

    pub fn reactivations(&self) -> impl Iterator<Item = &ExternalId> {
        self.ids_of(OperationKind::Reactivate)
    }

    pub fn deactivations(&self) -> impl Iterator<Item = &ExternalId> {
        self.ids_of(OperationKind::Deactivate)
    }

    fn ids_of(&self, kind: OperationKind) -> impl Iterator<Item = &ExternalId> {
        self.operations
            .iter()
            .filter(move |op| op.kind() == kind)
            .map(Operation::external_id)
    }
}

/// Compute the plan. Pure; performs no I/O.
pub fn reconcile(records: &[ExternalRecord], store: &StoreIndex) -> ReconcilePlan {
    let mut summary = ReconcileSummary {
        source_records: records.len(),
        store_rows: store.len(),
        ..ReconcileSummary::default()
    };
    let mut operations = Vec::new();
    let mut seen: HashSet<&ExternalId> = HashSet::with_capacity(records.len());

    for record in records {
        if !record.is_complete() {
            tracing::warn!(
                "skipping property with missing id or address: id='{}' address='{}'",
                record.external_id,
                record.display_name
            );
            summary.skipped += 1;
            continue;
        }
        if !seen.insert(&record.external_id) {
            tracing::warn!(
                "skipping duplicate property id {} ({})",
                record.external_id,
                record.display_name
            );
            summary.skipped += 1;
            continue;
        }

        match store.get(&record.external_id) {
            None => {
                tracing::debug!(
                    "new property: {} (ID: {})",
                    record.display_name,
                    record.external_id
                );
                summary.to_insert += 1;
                operations.push(Operation::Insert {
                    external_id: record.external_id.clone(),
                    display_name: record.display_name.clone(),
                });
            }
            Some(existing) if !existing.active => {
                tracing::debug!(
                    "inactive property is back: {} (ID: {})",
                    record.display_name,
                    record.external_id
                );
                summary.to_reactivate += 1;
                operations.push(Operation::SetActive {
                    external_id: record.external_id.clone(),
                    active: true,
                });
            }
            Some(_) => summary.unchanged += 1,
        }
    }

    for (external_id, row) in store.iter() {
        if row.active && !seen.contains(external_id) {
            tracing::debug!(
                "property gone upstream: {} (ID: {external_id})",
                row.display_name
            );
            summary.to_deactivate += 1;
            operations.push(Operation::SetActive {
                external_id: external_id.clone(),
                active: false,
            });
        }
    }

    ReconcilePlan {
        operations,
        summary,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
