//! Form draft persistence.

use crate::error::StoreResult;
use crate::offline_store::{Namespace, OfflineStore};
use loomworks_types::{Draft, DraftKind};

/// Saves and restores partially filled forms across sessions.
#[derive(Clone)]
pub struct DraftStore {
    store: OfflineStore,
}

impl DraftStore {
    pub fn new(store: OfflineStore) -> Self {
        Self { store }
    }

    /// Saves the form buffer, stamping the save time.
    pub fn save_draft(&self, kind: DraftKind, data: serde_json::Value) -> StoreResult<()> {
        let draft = Draft::new(data);
        let value = serde_json::to_value(&draft)?;
        self.store
            .try_put(Namespace::Drafts, kind.storage_key(), &value)
    }

    pub fn get_draft(&self, kind: DraftKind) -> StoreResult<Option<Draft>> {
        match self.store.try_get(Namespace::Drafts, kind.storage_key())? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub fn clear_draft(&self, kind: DraftKind) -> StoreResult<()> {
        self.store.try_remove(Namespace::Drafts, kind.storage_key())
    }
}
