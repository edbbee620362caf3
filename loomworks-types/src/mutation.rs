//! Durable mutation-queue entries.

use crate::EntityKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The write operation a queued mutation replays against the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationAction {
    Insert,
    Update,
    Delete,
}

/// A write performed while offline, persisted until it is confirmed
/// applied to the remote store.
///
/// `data` carries the entity payload for insert/update, or `{"id": …}`
/// for delete. Entries leave the queue only on remote success or after
/// exhausting their retry budget (dead-letter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedMutation {
    pub id: Uuid,
    pub kind: EntityKind,
    pub action: MutationAction,
    pub data: serde_json::Value,
    /// Failed replay attempts so far.
    #[serde(default)]
    pub attempts: u32,
    pub enqueued_at: DateTime<Utc>,
}

impl QueuedMutation {
    pub fn new(kind: EntityKind, action: MutationAction, data: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            action,
            data,
            attempts: 0,
            enqueued_at: Utc::now(),
        }
    }

    /// Target record id, for update/delete payloads.
    pub fn record_id(&self) -> Option<&str> {
        self.data.get("id").and_then(|v| v.as_str())
    }
}
