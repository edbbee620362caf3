//! FIFO durable queue of pending remote writes.
//!
//! The whole ordered sequence persists under a single key, so replay
//! order survives restarts. An entry leaves the queue only after its
//! remote operation succeeds, or after it exhausts its retry budget and
//! moves to the dead-letter list.

use crate::error::StoreResult;
use crate::offline_store::{Namespace, OfflineStore};
use loomworks_types::{EntityKind, MutationAction, QueuedMutation};
use tracing::{debug, warn};
use uuid::Uuid;

const QUEUE_KEY: &str = "queue";
const DEAD_LETTER_KEY: &str = "dead_letter";

/// Failed attempts before a mutation is moved to the dead-letter list.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// What happened to a queue entry after a failed replay attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDisposition {
    /// Still in the queue, will be retried on the next reconciliation.
    Retained,
    /// Retry budget exhausted; moved to the dead-letter list.
    DeadLettered,
}

/// Durable FIFO mutation queue over the store's Queue namespace.
#[derive(Clone)]
pub struct MutationQueue {
    store: OfflineStore,
    max_attempts: u32,
}

impl MutationQueue {
    pub fn new(store: OfflineStore) -> Self {
        Self::with_max_attempts(store, DEFAULT_MAX_ATTEMPTS)
    }

    pub fn with_max_attempts(store: OfflineStore, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Assigns an id and timestamp, appends to the persisted sequence.
    pub fn enqueue(
        &self,
        kind: EntityKind,
        action: MutationAction,
        data: serde_json::Value,
    ) -> StoreResult<QueuedMutation> {
        let mutation = QueuedMutation::new(kind, action, data);
        let mut entries = self.read(QUEUE_KEY)?;
        entries.push(mutation.clone());
        self.write(QUEUE_KEY, &entries)?;
        debug!(
            "enqueued {:?} {} ({} pending)",
            mutation.action,
            mutation.kind,
            entries.len()
        );
        Ok(mutation)
    }

    /// Current queue contents in FIFO order, without removing them.
    pub fn pending(&self) -> StoreResult<Vec<QueuedMutation>> {
        self.read(QUEUE_KEY)
    }

    /// Removes exactly the entry with the matching id, preserving the
    /// order of the rest.
    pub fn dequeue(&self, id: Uuid) -> StoreResult<()> {
        let mut entries = self.read(QUEUE_KEY)?;
        entries.retain(|m| m.id != id);
        self.write(QUEUE_KEY, &entries)
    }

    /// Records a failed replay attempt. Bumps the attempt counter; once
    /// the budget is exhausted the entry moves to the dead-letter list
    /// so a poison item cannot block the queue forever.
    pub fn record_failure(&self, id: Uuid) -> StoreResult<FailureDisposition> {
        let mut entries = self.read(QUEUE_KEY)?;
        let Some(pos) = entries.iter().position(|m| m.id == id) else {
            return Ok(FailureDisposition::Retained);
        };
        entries[pos].attempts += 1;

        if entries[pos].attempts >= self.max_attempts {
            let dead = entries.remove(pos);
            warn!(
                "mutation {} ({:?} {}) exhausted {} attempts, moving to dead letter",
                dead.id, dead.action, dead.kind, self.max_attempts
            );
            let mut dead_letters = self.read(DEAD_LETTER_KEY)?;
            dead_letters.push(dead);
            self.write(DEAD_LETTER_KEY, &dead_letters)?;
            self.write(QUEUE_KEY, &entries)?;
            return Ok(FailureDisposition::DeadLettered);
        }

        self.write(QUEUE_KEY, &entries)?;
        Ok(FailureDisposition::Retained)
    }

    /// Mutations that exhausted their retry budget.
    pub fn dead_letters(&self) -> StoreResult<Vec<QueuedMutation>> {
        self.read(DEAD_LETTER_KEY)
    }

    /// Empties the queue. Explicit reset scenarios only, never part of
    /// the normal sync flow.
    pub fn clear(&self) -> StoreResult<()> {
        self.write(QUEUE_KEY, &[])
    }

    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read(QUEUE_KEY)?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.read(QUEUE_KEY)?.is_empty())
    }

    fn read(&self, key: &str) -> StoreResult<Vec<QueuedMutation>> {
        match self.store.try_get(Namespace::Queue, key)? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    fn write(&self, key: &str, entries: &[QueuedMutation]) -> StoreResult<()> {
        let value = serde_json::to_value(entries)?;
        self.store.try_put(Namespace::Queue, key, &value)
    }
}
