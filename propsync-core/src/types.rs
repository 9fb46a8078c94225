//! Domain types for the property roster.
//!
//! [`ExternalRecord`] is what the property-management source reports;
//! [`StoreRecord`] is a row of the destination `properties` table;
//! [`Operation`] is a derived mutation, never persisted.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Identifier of a property in the upstream system, rendered as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalId(pub String);

impl ExternalId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lenient conversion from a JSON scalar.
    ///
    /// Numbers and strings become their textual form (strings trimmed);
    /// `null`, missing values and anything else become the empty id.
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) => Self(s.trim().to_owned()),
            Some(Value::Number(n)) => Self(n.to_string()),
            _ => Self(String::new()),
        }
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ExternalId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ExternalId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A property as reported by the upstream system.
///
/// Emptiness is not validated here; the reconciler skips records with an
/// empty id or name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRecord {
    pub external_id: ExternalId,
    pub display_name: String,
}

impl ExternalRecord {
    pub fn new(external_id: impl Into<ExternalId>, display_name: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            display_name: display_name.into(),
        }
    }

    /// `true` when both the id and the display name are non-blank.
    pub fn is_complete(&self) -> bool {
        !self.external_id.0.trim().is_empty() && !self.display_name.trim().is_empty()
    }
}

/// A row of the destination `properties` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreRecord {
    /// Primary key assigned by the store. Opaque to the reconciler.
    pub internal_id: Value,
    pub display_name: String,
    pub external_id: Option<ExternalId>,
    pub active: bool,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// A single mutation requested against the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Create a new row with `active = true`.
    Insert {
        external_id: ExternalId,
        display_name: String,
    },
    /// Flip the active flag of the row with this external id.
    SetActive {
        external_id: ExternalId,
        active: bool,
    },
}

impl Operation {
    pub fn external_id(&self) -> &ExternalId {
        match self {
            Operation::Insert { external_id, .. } | Operation::SetActive { external_id, .. } => {
                external_id
            }
        }
    }

    /// Short verb used in logs and summaries.
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Insert { .. } => OperationKind::Insert,
            Operation::SetActive { active: true, .. } => OperationKind::Reactivate,
            Operation::SetActive { active: false, .. } => OperationKind::Deactivate,
        }
    }
}

/// Classification of an [`Operation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Insert,
    Reactivate,
    Deactivate,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Insert => write!(f, "insert"),
            OperationKind::Reactivate => write!(f, "reactivate"),
            OperationKind::Deactivate => write!(f, "deactivate"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
