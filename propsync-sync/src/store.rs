//! Destination `properties` table: reader, writer, and the external-id index.
//!
//! The store speaks PostgREST (Supabase):
//!
//! ```text
//! GET   /rest/v1/properties?select=id,address,appfolio_id,active
//! POST  /rest/v1/properties                       {address, appfolio_id, active}
//! PATCH /rest/v1/properties?appfolio_id=eq.<id>   {active}
//! ```

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{json, Value};

use propsync_core::{ExternalId, OperationKind, StoreConfig, StoreRecord};

use crate::error::{FetchError, HttpError, WriteError};

/// Table path, relative to the store URL.
pub const PROPERTIES_PATH: &str = "/rest/v1/properties";

/// Columns requested when listing rows.
pub const SELECT_COLUMNS: &str = "id,address,appfolio_id,active";

const DATASET: &str = "store rows";

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Reads every destination row that carries an external id.
pub trait StoreReader {
    fn fetch_index(&self) -> Result<StoreIndex, FetchError>;
}

/// Applies single mutations to the destination. Calls are independent.
pub trait StoreWriter {
    /// Create a new active row.
    fn insert(&self, external_id: &ExternalId, display_name: &str) -> Result<(), WriteError>;

    /// Update only the active flag of the row with this external id.
    fn set_active(&self, external_id: &ExternalId, active: bool) -> Result<(), WriteError>;
}

// ---------------------------------------------------------------------------
// StoreIndex
// ---------------------------------------------------------------------------

/// Store rows keyed by external id, iterated in the order the store
/// returned them.
#[derive(Debug, Clone, Default)]
pub struct StoreIndex {
    rows: Vec<StoreRecord>,
    positions: HashMap<ExternalId, usize>,
    unindexed: usize,
}

impl StoreIndex {
    /// Index `rows`. Rows without an external id are counted but excluded.
    ///
    /// If two rows share an external id the later one replaces the earlier
    /// one, keeping the earlier position.
    pub fn from_rows(rows: impl IntoIterator<Item = StoreRecord>) -> Self {
        let mut index = StoreIndex::default();
        for row in rows {
            let Some(id) = row.external_id.clone().filter(|id| !id.is_empty()) else {
                index.unindexed += 1;
                continue;
            };
            match index.positions.get(&id) {
                Some(&pos) => {
                    tracing::warn!("duplicate store rows for external id {id}; keeping the last");
                    index.rows[pos] = row;
                }
                None => {
                    index.positions.insert(id, index.rows.len());
                    index.rows.push(row);
                }
            }
        }
        index
    }

    pub fn get(&self, external_id: &ExternalId) -> Option<&StoreRecord> {
        self.positions.get(external_id).map(|&pos| &self.rows[pos])
    }

    pub fn contains(&self, external_id: &ExternalId) -> bool {
        self.positions.contains_key(external_id)
    }

    /// `(external_id, row)` pairs in store order.
    pub fn iter(&self) -> impl Iterator<Item = (&ExternalId, &StoreRecord)> {
        self.rows
            .iter()
            .filter_map(|row| row.external_id.as_ref().map(|id| (id, row)))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows skipped because they had no external id.
    pub fn unindexed(&self) -> usize {
        self.unindexed
    }
}

// ---------------------------------------------------------------------------
// SupabaseClient
// ---------------------------------------------------------------------------

/// Blocking PostgREST client for the `properties` table.
pub struct SupabaseClient {
    agent: ureq::Agent,
    table_url: String,
    service_key: String,
    bearer: String,
}

impl SupabaseClient {
    pub fn new(config: &StoreConfig) -> Self {
        let key = config.service_key.expose();
        Self {
            agent: ureq::AgentBuilder::new().build(),
            table_url: format!("{}{PROPERTIES_PATH}", config.url),
            service_key: key.to_owned(),
            bearer: format!("Bearer {key}"),
        }
    }

    fn request(&self, method: &str) -> ureq::Request {
        self.agent
            .request(method, &self.table_url)
            .set("apikey", &self.service_key)
            .set("Authorization", &self.bearer)
            .set("Content-Type", "application/json")
    }
}

impl StoreReader for SupabaseClient {
    fn fetch_index(&self) -> Result<StoreIndex, FetchError> {
        tracing::info!("fetching properties from Supabase");

        let response = self
            .request("GET")
            .query("select", SELECT_COLUMNS)
            .call()
            .map_err(|e| FetchError::new(DATASET, e))?;
        let rows: Vec<PropertyRow> = response
            .into_json()
            .map_err(|e| FetchError::new(DATASET, HttpError::Decode(e)))?;

        let total = rows.len();
        let index = StoreIndex::from_rows(rows.into_iter().map(PropertyRow::into_record));
        tracing::info!(
            "fetched {total} properties from Supabase ({} with appfolio_id)",
            index.len()
        );
        Ok(index)
    }
}

impl StoreWriter for SupabaseClient {
    fn insert(&self, external_id: &ExternalId, display_name: &str) -> Result<(), WriteError> {
        self.request("POST")
            .set("Prefer", "return=minimal")
            .send_json(json!({
                "address": display_name,
                "appfolio_id": external_id,
                "active": true,
            }))
            .map(drop)
            .map_err(|e| WriteError {
                kind: OperationKind::Insert,
                external_id: external_id.clone(),
                source: e.into(),
            })
    }

    fn set_active(&self, external_id: &ExternalId, active: bool) -> Result<(), WriteError> {
        let kind = if active {
            OperationKind::Reactivate
        } else {
            OperationKind::Deactivate
        };
        self.request("PATCH")
            .query("appfolio_id", &format!("eq.{external_id}"))
            .set("Prefer", "return=minimal")
            .send_json(json!({ "active": active }))
            .map(drop)
            .map_err(|e| WriteError {
                kind,
                external_id: external_id.clone(),
                source: e.into(),
            })
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PropertyRow {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    appfolio_id: Option<Value>,
    #[serde(default)]
    active: Option<bool>,
}

impl PropertyRow {
    fn into_record(self) -> StoreRecord {
        let external_id = Some(ExternalId::from_json(self.appfolio_id.as_ref()))
            .filter(|id| !id.is_empty());
        StoreRecord {
            internal_id: self.id,
            display_name: self.address.unwrap_or_default(),
            external_id,
            active: self.active.unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, external: Option<&str>, active: bool) -> StoreRecord {
        StoreRecord {
            internal_id: json!(id),
            display_name: format!("{id} Main St"),
            external_id: external.map(ExternalId::from),
            active,
        }
    }

    #[test]
    fn rows_without_external_id_are_counted_not_indexed() {
        let index = StoreIndex::from_rows(vec![
            row(1, Some("A"), true),
            row(2, None, true),
            row(3, Some(""), false),
        ]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.unindexed(), 2);
        assert!(index.contains(&"A".into()));
    }

    #[test]
    fn iteration_follows_store_order() {
        let index = StoreIndex::from_rows(vec![
            row(1, Some("C"), true),
            row(2, Some("A"), false),
            row(3, Some("B"), true),
        ]);
        let ids: Vec<&str> = index.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
    }

    #[test]
    fn duplicate_external_id_keeps_last_row_at_first_position() {
        let index = StoreIndex::from_rows(vec![
            row(1, Some("A"), true),
            row(2, Some("B"), true),
            row(3, Some("A"), false),
        ]);
        assert_eq!(index.len(), 2);
        let first = index.iter().next().expect("row");
        assert_eq!(first.0.as_str(), "A");
        assert_eq!(first.1.internal_id, json!(3));
        assert!(!index.get(&"A".into()).expect("A").active);
    }

    #[test]
    fn wire_rows_tolerate_nulls_and_numeric_ids() {
        let rows: Vec<PropertyRow> = serde_json::from_str(
            r#"[
                {"id": "9f1c", "address": null, "appfolio_id": 55, "active": null},
                {"id": 2, "address": "1 Bay Rd", "appfolio_id": null, "active": true}
            ]"#,
        )
        .expect("parse");
        let records: Vec<StoreRecord> = rows.into_iter().map(PropertyRow::into_record).collect();
        assert_eq!(records[0].external_id, Some(ExternalId::from("55")));
        assert_eq!(records[0].display_name, "");
        assert!(!records[0].active);
        assert_eq!(records[1].external_id, None);
    }
}
