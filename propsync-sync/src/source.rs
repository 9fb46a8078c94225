//! Property roster fetcher for the AppFolio reporting API.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};

use propsync_core::{ExternalId, ExternalRecord, SourceConfig};

use crate::error::{FetchError, HttpError};

/// Report endpoint, relative to the configured base URL.
pub const PROPERTY_DIRECTORY_PATH: &str = "/api/v2/reports/property_directory.json";

const DATASET: &str = "source roster";

/// Anything that can produce the current list of active upstream properties.
pub trait SourceFetcher {
    /// Return the complete roster or fail; there is no partial result.
    fn fetch_active(&self) -> Result<Vec<ExternalRecord>, FetchError>;
}

/// Blocking client for the property directory report.
pub struct AppFolioClient {
    agent: ureq::Agent,
    url: String,
    authorization: String,
}

impl AppFolioClient {
    pub fn new(config: &SourceConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        let credentials = format!("{}:{}", config.client_id, config.client_secret.expose());
        Self {
            agent,
            url: format!("{}{PROPERTY_DIRECTORY_PATH}", config.base_url),
            authorization: format!("Basic {}", STANDARD.encode(credentials)),
        }
    }
}

impl SourceFetcher for AppFolioClient {
    fn fetch_active(&self) -> Result<Vec<ExternalRecord>, FetchError> {
        tracing::info!("fetching properties from AppFolio");

        let response = self
            .agent
            .post(&self.url)
            .set("Authorization", &self.authorization)
            .set("Content-Type", "application/json")
            .send_json(json!({ "property_visibility": "active" }))
            .map_err(|e| FetchError::new(DATASET, e))?;

        let directory: PropertyDirectory = response
            .into_json()
            .map_err(|e| FetchError::new(DATASET, HttpError::Decode(e)))?;

        let records: Vec<ExternalRecord> = directory
            .results
            .unwrap_or_default()
            .into_iter()
            .map(DirectoryRow::into_record)
            .collect();

        tracing::info!("fetched {} active properties from AppFolio", records.len());
        Ok(records)
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PropertyDirectory {
    #[serde(default)]
    results: Option<Vec<DirectoryRow>>,
}

#[derive(Debug, Deserialize)]
struct DirectoryRow {
    #[serde(default)]
    property_id: Option<Value>,
    #[serde(default)]
    property_address: Option<Value>,
}

impl DirectoryRow {
    fn into_record(self) -> ExternalRecord {
        let display_name = match self.property_address {
            Some(Value::String(address)) => address.trim().to_owned(),
            _ => String::new(),
        };
        ExternalRecord {
            external_id: ExternalId::from_json(self.property_id.as_ref()),
            display_name,
        }
    }
}
