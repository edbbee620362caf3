//! Remote row store contract.

use async_trait::async_trait;
use loomworks_types::{EntityKind, OwnerId, Record};
use serde_json::Value;

use crate::error::SyncResult;

/// Owner-scoped row operations against the remote store.
///
/// Every call is scoped to a single owner; implementations must never
/// return or touch rows belonging to anyone else. The production
/// implementation is [`RestRowStore`](crate::RestRowStore); tests swap in
/// an in-memory fake.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetches every row of `kind` owned by `owner`.
    async fn list(&self, kind: EntityKind, owner: &OwnerId) -> SyncResult<Vec<Record>>;

    /// Inserts a row and returns it as stored, including the
    /// server-assigned id.
    async fn insert(&self, kind: EntityKind, owner: &OwnerId, fields: &Value)
        -> SyncResult<Record>;

    /// Applies a partial-field patch to the row matching `id`.
    async fn update(
        &self,
        kind: EntityKind,
        owner: &OwnerId,
        id: &str,
        patch: &Value,
    ) -> SyncResult<()>;

    /// Deletes the row matching `id`.
    async fn delete(&self, kind: EntityKind, owner: &OwnerId, id: &str) -> SyncResult<()>;
}
