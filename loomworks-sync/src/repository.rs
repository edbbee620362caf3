//! Generic entity repository.
//!
//! One CRUD facade over every entity kind. Writes apply to the in-memory
//! collections first. Online, they then go straight to the remote store;
//! a remote failure rolls the in-memory change back and surfaces the
//! error. Offline, they enqueue a durable mutation instead and re-cache
//! the collection snapshot, so both the change and its pending write
//! survive a restart.

use loomworks_store::{MutationQueue, Namespace, OfflineStore};
use loomworks_types::{next_local_id, EntityKind, MutationAction, OwnerId, Record};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::collections::{Collections, SharedCollections};
use crate::connectivity::ConnectivityMonitor;
use crate::error::{SyncError, SyncResult};
use crate::remote::RemoteStore;

/// Repository over the shared in-memory collections.
#[derive(Clone)]
pub struct Repository {
    collections: SharedCollections,
    store: OfflineStore,
    queue: MutationQueue,
    connectivity: ConnectivityMonitor,
    remote: Arc<dyn RemoteStore>,
    owner: OwnerId,
}

impl Repository {
    pub fn new(
        collections: SharedCollections,
        store: OfflineStore,
        queue: MutationQueue,
        connectivity: ConnectivityMonitor,
        remote: Arc<dyn RemoteStore>,
        owner: OwnerId,
    ) -> Self {
        Self {
            collections,
            store,
            queue,
            connectivity,
            remote,
            owner,
        }
    }

    /// Current records of a collection kind.
    pub async fn list(&self, kind: EntityKind) -> Vec<Record> {
        self.collections.read().await.records(kind).to_vec()
    }

    pub async fn company_details(&self) -> Option<Record> {
        self.collections.read().await.company_details().cloned()
    }

    /// Creates a record.
    ///
    /// The record appears in memory immediately under a client-generated
    /// id. Online, the remote store assigns the authoritative id and the
    /// staged record is replaced by the server's version. Offline, the
    /// staged record keeps its client id until the queue replays.
    pub async fn create(&self, kind: EntityKind, fields: Value) -> SyncResult<Record> {
        if kind.is_singleton() {
            return Err(SyncError::InvalidMutation(format!(
                "{kind} is a singleton, use set_company_details"
            )));
        }

        let staged = Record::staged(fields);
        let payload = Value::Object(staged.fields.clone());
        self.collections
            .write()
            .await
            .push_record(kind, staged.clone());

        if self.connectivity.is_online() {
            match self.remote.insert(kind, &self.owner, &payload).await {
                Ok(server) => {
                    self.collections
                        .write()
                        .await
                        .replace_record(kind, &staged.id, server.clone());
                    debug!("created {kind} record {} (was {})", server.id, staged.id);
                    Ok(server)
                }
                Err(e) => {
                    self.collections
                        .write()
                        .await
                        .remove_record(kind, &staged.id);
                    Err(e)
                }
            }
        } else {
            self.queue
                .enqueue(kind, MutationAction::Insert, payload)?;
            let collections = self.collections.read().await;
            self.persist_snapshot(&collections, kind);
            debug!("created {kind} record {} offline", staged.id);
            Ok(staged)
        }
    }

    /// Applies a partial-field update to the record matching `id`.
    pub async fn update(&self, kind: EntityKind, id: &str, patch: Value) -> SyncResult<Record> {
        let (previous, updated) = {
            let mut collections = self.collections.write().await;
            let previous = collections
                .merge_record(kind, id, &patch)
                .ok_or_else(|| unknown_record(kind, id))?;
            let updated = collections
                .records(kind)
                .iter()
                .find(|r| r.id == id)
                .cloned()
                .ok_or_else(|| unknown_record(kind, id))?;
            (previous, updated)
        };

        if self.connectivity.is_online() {
            if let Err(e) = self.remote.update(kind, &self.owner, id, &patch).await {
                self.collections
                    .write()
                    .await
                    .replace_record(kind, id, previous);
                return Err(e);
            }
            Ok(updated)
        } else {
            self.queue
                .enqueue(kind, MutationAction::Update, with_id(patch, id))?;
            let collections = self.collections.read().await;
            self.persist_snapshot(&collections, kind);
            Ok(updated)
        }
    }

    /// Deletes the record matching `id`.
    pub async fn delete(&self, kind: EntityKind, id: &str) -> SyncResult<()> {
        let (pos, removed) = self
            .collections
            .write()
            .await
            .remove_record(kind, id)
            .ok_or_else(|| unknown_record(kind, id))?;

        if self.connectivity.is_online() {
            if let Err(e) = self.remote.delete(kind, &self.owner, id).await {
                self.collections
                    .write()
                    .await
                    .restore_record(kind, pos, removed);
                return Err(e);
            }
            Ok(())
        } else {
            self.queue
                .enqueue(kind, MutationAction::Delete, serde_json::json!({ "id": id }))?;
            let collections = self.collections.read().await;
            self.persist_snapshot(&collections, kind);
            Ok(())
        }
    }

    /// Replaces the company-details singleton (insert-or-update).
    ///
    /// Online, whichever row already exists remotely is updated in place;
    /// otherwise one is inserted. Offline, the upsert is queued and
    /// replays with the same insert-or-update semantics.
    pub async fn set_company_details(&self, fields: Value) -> SyncResult<Record> {
        let kind = EntityKind::CompanyDetails;
        let (previous, record) = {
            let mut collections = self.collections.write().await;
            let id = collections
                .company_details()
                .map(|r| r.id.clone())
                .unwrap_or_else(next_local_id);
            let record = Record::with_id(id, fields.clone());
            let previous = collections.set_company_details(Some(record.clone()));
            (previous, record)
        };

        if self.connectivity.is_online() {
            if let Err(e) = self.upsert_remote_singleton(kind, &fields).await {
                self.collections
                    .write()
                    .await
                    .set_company_details(previous);
                return Err(e);
            }
            Ok(record)
        } else {
            self.queue
                .enqueue(kind, MutationAction::Update, fields)?;
            let collections = self.collections.read().await;
            self.persist_snapshot(&collections, kind);
            Ok(record)
        }
    }

    async fn upsert_remote_singleton(&self, kind: EntityKind, fields: &Value) -> SyncResult<()> {
        let existing = self.remote.list(kind, &self.owner).await?;
        match existing.first() {
            Some(current) => {
                self.remote
                    .update(kind, &self.owner, &current.id, fields)
                    .await
            }
            None => {
                self.remote.insert(kind, &self.owner, fields).await?;
                Ok(())
            }
        }
    }

    /// Re-caches a collection snapshot after an offline mutation, so the
    /// optimistic state is what a restarted process loads.
    fn persist_snapshot(&self, collections: &Collections, kind: EntityKind) {
        let snapshot = if kind.is_singleton() {
            collections
                .company_details()
                .and_then(|r| serde_json::to_value(r).ok())
                .unwrap_or(Value::Null)
        } else {
            match serde_json::to_value(collections.records(kind)) {
                Ok(snapshot) => snapshot,
                Err(_) => return,
            }
        };
        self.store.put(Namespace::Cache, kind.cache_key(), &snapshot);
    }
}

fn unknown_record(kind: EntityKind, id: &str) -> SyncError {
    SyncError::InvalidMutation(format!("no {kind} record with id {id}"))
}

fn with_id(patch: Value, id: &str) -> Value {
    match patch {
        Value::Object(mut map) => {
            map.insert("id".to_string(), Value::String(id.to_string()));
            Value::Object(map)
        }
        other => other,
    }
}
