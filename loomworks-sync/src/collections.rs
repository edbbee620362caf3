//! Shared in-memory entity state.
//!
//! Owned jointly by the sync engine (which overwrites it wholesale on
//! fetch) and the repository (which mutates it optimistically). Nothing
//! else writes to it.

use loomworks_types::{EntityKind, Record};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The current in-memory copy of every entity collection, plus the
/// company-details singleton.
#[derive(Debug, Clone, Default)]
pub struct Collections {
    records: HashMap<EntityKind, Vec<Record>>,
    company_details: Option<Record>,
}

/// Handle shared between the engine and the repository.
pub type SharedCollections = Arc<RwLock<Collections>>;

impl Collections {
    pub fn shared() -> SharedCollections {
        Arc::new(RwLock::new(Collections::default()))
    }

    /// Records of a collection kind. Empty for the singleton kind, which
    /// lives in [`company_details`](Self::company_details) instead.
    pub fn records(&self, kind: EntityKind) -> &[Record] {
        self.records.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replaces a whole collection (fetch/refresh path).
    pub fn set_records(&mut self, kind: EntityKind, records: Vec<Record>) {
        self.records.insert(kind, records);
    }

    pub fn company_details(&self) -> Option<&Record> {
        self.company_details.as_ref()
    }

    /// Replaces the singleton, returning the previous value.
    pub fn set_company_details(&mut self, record: Option<Record>) -> Option<Record> {
        std::mem::replace(&mut self.company_details, record)
    }

    /// Appends an optimistic record.
    pub fn push_record(&mut self, kind: EntityKind, record: Record) {
        self.records.entry(kind).or_default().push(record);
    }

    /// Replaces the record matching `id` in place (optimistic-id
    /// reconciliation). Returns false if no record matched.
    pub fn replace_record(&mut self, kind: EntityKind, id: &str, record: Record) -> bool {
        if let Some(existing) = self.find_mut(kind, id) {
            *existing = record;
            true
        } else {
            false
        }
    }

    /// Merges a partial-field patch into the record matching `id`,
    /// returning the record's previous value for rollback.
    pub fn merge_record(
        &mut self,
        kind: EntityKind,
        id: &str,
        patch: &serde_json::Value,
    ) -> Option<Record> {
        let record = self.find_mut(kind, id)?;
        let previous = record.clone();
        record.merge(patch);
        Some(previous)
    }

    /// Removes the record matching `id`, returning its position and value
    /// so a failed remote delete can restore it.
    pub fn remove_record(&mut self, kind: EntityKind, id: &str) -> Option<(usize, Record)> {
        let records = self.records.get_mut(&kind)?;
        let pos = records.iter().position(|r| r.id == id)?;
        Some((pos, records.remove(pos)))
    }

    /// Re-inserts a record at its original position (rollback path).
    pub fn restore_record(&mut self, kind: EntityKind, pos: usize, record: Record) {
        let records = self.records.entry(kind).or_default();
        let pos = pos.min(records.len());
        records.insert(pos, record);
    }

    fn find_mut(&mut self, kind: EntityKind, id: &str) -> Option<&mut Record> {
        self.records
            .get_mut(&kind)?
            .iter_mut()
            .find(|r| r.id == id)
    }
}
