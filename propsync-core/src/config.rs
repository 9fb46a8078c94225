//! Layered run configuration.
//!
//! # Sources
//!
//! ```text
//! 1. CLI flag / environment variable   (highest)
//! 2. YAML file: --config <path>, else ~/.propsync/config.yaml if present
//! 3. built-in defaults                  (base URL, timeout only)
//! ```
//!
//! Each layer is a [`ConfigLayer`] of optional values. [`SyncConfig::from_layer`]
//! validates the merged result once; every required value that is still
//! absent is reported together in [`ConfigError::Missing`].
//!
//! # API pattern
//!
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const APPFOLIO_CLIENT_ID: &str = "APPFOLIO_CLIENT_ID";
pub const APPFOLIO_CLIENT_SECRET: &str = "APPFOLIO_CLIENT_SECRET";
pub const APPFOLIO_BASE_URL: &str = "APPFOLIO_BASE_URL";
pub const SUPABASE_URL: &str = "SUPABASE_URL";
pub const SUPABASE_SERVICE_KEY: &str = "SUPABASE_SERVICE_KEY";
pub const SOURCE_TIMEOUT_SECS: &str = "PROPSYNC_SOURCE_TIMEOUT_SECS";

pub const DEFAULT_APPFOLIO_BASE_URL: &str = "https://keyrenter072.appfolio.com";
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Secret
// ---------------------------------------------------------------------------

/// A credential whose `Debug` output never shows the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// First four characters followed by asterisks; fully masked when short.
    pub fn masked(&self) -> String {
        if self.0.chars().count() <= 8 {
            return "********".to_owned();
        }
        let head: String = self.0.chars().take(4).collect();
        format!("{head}********")
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

// ---------------------------------------------------------------------------
// Layers
// ---------------------------------------------------------------------------

/// One layer of partially specified configuration values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appfolio_client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appfolio_client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appfolio_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supabase_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supabase_service_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_timeout_secs: Option<u64>,
}

impl ConfigLayer {
    /// Fill every value absent from `self` with the one from `lower`.
    /// Empty strings count as absent.
    pub fn or(self, lower: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            appfolio_client_id: pick(self.appfolio_client_id, lower.appfolio_client_id),
            appfolio_client_secret: pick(
                self.appfolio_client_secret,
                lower.appfolio_client_secret,
            ),
            appfolio_base_url: pick(self.appfolio_base_url, lower.appfolio_base_url),
            supabase_url: pick(self.supabase_url, lower.supabase_url),
            supabase_service_key: pick(self.supabase_service_key, lower.supabase_service_key),
            source_timeout_secs: self.source_timeout_secs.or(lower.source_timeout_secs),
        }
    }
}

fn pick(upper: Option<String>, lower: Option<String>) -> Option<String> {
    non_empty(upper).or_else(|| non_empty(lower))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Validated configuration
// ---------------------------------------------------------------------------

/// Connection settings for the property-management source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// Scheme and host, no trailing slash.
    pub base_url: String,
    pub client_id: String,
    pub client_secret: Secret,
    pub timeout: Duration,
}

/// Connection settings for the destination store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Project URL, no trailing slash.
    pub url: String,
    pub service_key: Secret,
}

/// Fully validated run configuration, passed to each client at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub source: SourceConfig,
    pub store: StoreConfig,
}

impl SyncConfig {
    /// Validate a merged layer.
    pub fn from_layer(layer: ConfigLayer) -> Result<Self, ConfigError> {
        let layer = layer.or(ConfigLayer::default());

        let mut missing = Vec::new();
        let mut require = |value: Option<String>, name: &'static str| {
            if value.is_none() {
                missing.push(name);
            }
            value.unwrap_or_default()
        };
        let client_id = require(layer.appfolio_client_id, APPFOLIO_CLIENT_ID);
        let client_secret = require(layer.appfolio_client_secret, APPFOLIO_CLIENT_SECRET);
        let store_url = require(layer.supabase_url, SUPABASE_URL);
        let service_key = require(layer.supabase_service_key, SUPABASE_SERVICE_KEY);
        if !missing.is_empty() {
            return Err(ConfigError::Missing { names: missing });
        }

        let base_url = layer
            .appfolio_base_url
            .unwrap_or_else(|| DEFAULT_APPFOLIO_BASE_URL.to_owned());

        let timeout = match layer.source_timeout_secs {
            None => DEFAULT_SOURCE_TIMEOUT,
            Some(0) => {
                return Err(ConfigError::InvalidTimeout {
                    name: SOURCE_TIMEOUT_SECS,
                    value: "0".to_owned(),
                })
            }
            Some(secs) => Duration::from_secs(secs),
        };

        Ok(Self {
            source: SourceConfig {
                base_url: validate_url(APPFOLIO_BASE_URL, base_url)?,
                client_id,
                client_secret: Secret::new(client_secret),
                timeout,
            },
            store: StoreConfig {
                url: validate_url(SUPABASE_URL, store_url)?,
                service_key: Secret::new(service_key),
            },
        })
    }
}

fn validate_url(name: &'static str, value: String) -> Result<String, ConfigError> {
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(ConfigError::InvalidUrl { name, value });
    }
    Ok(value.trim_end_matches('/').to_owned())
}

/// Parse a timeout given as text (flag or environment variable).
///
/// Zero and anything that is not a whole number of seconds are rejected.
pub fn parse_timeout_secs(value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidTimeout {
            name: SOURCE_TIMEOUT_SECS,
            value: value.to_owned(),
        }),
    }
}

// ---------------------------------------------------------------------------
// File loading
// ---------------------------------------------------------------------------

/// `<home>/.propsync/config.yaml`: pure, no I/O.
pub fn default_path_at(home: &Path) -> PathBuf {
    home.join(".propsync").join("config.yaml")
}

/// Parse a YAML config file into a layer.
pub fn load_file(path: &Path) -> Result<ConfigLayer, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(ConfigLayer::default());
    }
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Merge `overrides` over the file layer and validate.
///
/// An explicit `config_file` must exist. Without one, the default file under
/// `home` is used when present; `home = None` skips it.
pub fn resolve_at(
    home: Option<&Path>,
    config_file: Option<&Path>,
    overrides: ConfigLayer,
) -> Result<SyncConfig, ConfigError> {
    let file_layer = match (config_file, home) {
        (Some(path), _) => load_file(path)?,
        (None, Some(home)) => {
            let path = default_path_at(home);
            if path.exists() {
                load_file(&path)?
            } else {
                ConfigLayer::default()
            }
        }
        (None, None) => ConfigLayer::default(),
    };
    SyncConfig::from_layer(overrides.or(file_layer))
}

/// `resolve_at` convenience wrapper using `dirs::home_dir()`.
pub fn resolve(
    config_file: Option<&Path>,
    overrides: ConfigLayer,
) -> Result<SyncConfig, ConfigError> {
    let home = dirs::home_dir();
    resolve_at(home.as_deref(), config_file, overrides)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
