//! Form draft buffers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The entry forms that persist drafts between sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftKind {
    CreatePurchaseOrder,
    CreateQualityRecord,
}

impl DraftKind {
    /// Key the draft is stored under in the drafts namespace.
    pub fn storage_key(&self) -> &'static str {
        match self {
            DraftKind::CreatePurchaseOrder => "create_po",
            DraftKind::CreateQualityRecord => "create_quality",
        }
    }
}

/// A partially filled form, saved so the user can resume later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub data: serde_json::Value,
    pub saved_at: DateTime<Utc>,
}

impl Draft {
    pub fn new(data: serde_json::Value) -> Self {
        Self {
            data,
            saved_at: Utc::now(),
        }
    }
}
