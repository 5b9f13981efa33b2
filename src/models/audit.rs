use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of change an audit entry records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Create,
    Update,
    Delete,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// One entry in the append-only change history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: i64,
    pub operation: OperationType,
    pub entity_name: String,
    /// `None` when the entity had not been persisted yet at log time.
    pub entity_id: Option<i64>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Free-form change description, typically a small JSON document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<String>,
}

/// Implemented by every persisted entity that can be audited. Replaces
/// runtime introspection of id getters with an explicit capability.
pub trait Identified {
    fn entity_name(&self) -> &'static str;
    fn entity_id(&self) -> Option<i64>;
}

/// Criteria for querying the audit history; unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub operation: Option<OperationType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub username: Option<String>,
}
