//! Sync engine: fetch, cache fallback, and queue replay.
//!
//! A single orchestration task owns the engine, so fetch and reconcile
//! cycles never overlap: triggers arriving mid-cycle (commands or
//! connectivity edges) queue up behind the running one instead of racing
//! on the cache keys. Rapid connectivity flips coalesce through the
//! watch channel into whatever the latest state is.

use futures::future::join_all;
use loomworks_store::{MutationQueue, Namespace, OfflineStore};
use loomworks_types::{EntityKind, MutationAction, OwnerId, QueuedMutation, Record};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::collections::SharedCollections;
use crate::config::SyncConfig;
use crate::connectivity::ConnectivityMonitor;
use crate::error::{SyncError, SyncResult};
use crate::remote::RemoteStore;

/// Commands accepted by the engine task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncCommand {
    /// Fetch every collection (or load from cache when offline).
    Refresh,
    /// Replay the pending mutation queue, then refresh.
    Reconcile,
    Shutdown,
}

/// Notifications emitted by the engine task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A refresh cycle finished. `from_cache` is true when the data came
    /// from the local snapshots rather than the remote store.
    RefreshCompleted { from_cache: bool },
    /// A reconciliation cycle finished.
    ReconcileCompleted {
        applied: usize,
        failed: usize,
        dead_lettered: usize,
    },
}

/// Outcome counters for one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub applied: usize,
    pub failed: usize,
    pub dead_lettered: usize,
}

/// Clonable handle for driving a running engine task.
#[derive(Clone)]
pub struct SyncEngineHandle {
    command_tx: mpsc::Sender<SyncCommand>,
}

impl SyncEngineHandle {
    pub async fn refresh(&self) -> SyncResult<()> {
        self.send(SyncCommand::Refresh).await
    }

    pub async fn reconcile(&self) -> SyncResult<()> {
        self.send(SyncCommand::Reconcile).await
    }

    pub async fn shutdown(&self) -> SyncResult<()> {
        self.send(SyncCommand::Shutdown).await
    }

    async fn send(&self, command: SyncCommand) -> SyncResult<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| SyncError::EngineStopped)
    }
}

/// The data synchronization engine.
///
/// Create with [`create_sync_engine`], then drive it either through the
/// handle after spawning [`run`](SyncEngine::run), or by calling
/// [`refresh`](SyncEngine::refresh) and [`reconcile`](SyncEngine::reconcile)
/// directly.
pub struct SyncEngine {
    collections: SharedCollections,
    store: OfflineStore,
    queue: MutationQueue,
    remote: Arc<dyn RemoteStore>,
    connectivity: ConnectivityMonitor,
    owner: OwnerId,
    command_rx: mpsc::Receiver<SyncCommand>,
    event_tx: mpsc::Sender<SyncEvent>,
}

/// Builds an engine plus its control handle and event stream.
pub fn create_sync_engine(
    collections: SharedCollections,
    store: OfflineStore,
    queue: MutationQueue,
    remote: Arc<dyn RemoteStore>,
    connectivity: ConnectivityMonitor,
    owner: OwnerId,
    config: &SyncConfig,
) -> (SyncEngineHandle, mpsc::Receiver<SyncEvent>, SyncEngine) {
    let (command_tx, command_rx) = mpsc::channel(config.command_buffer);
    let (event_tx, event_rx) = mpsc::channel(config.event_buffer);

    let engine = SyncEngine {
        collections,
        store,
        queue,
        remote,
        connectivity,
        owner,
        command_rx,
        event_tx,
    };

    (SyncEngineHandle { command_tx }, event_rx, engine)
}

impl SyncEngine {
    /// Runs the orchestration loop until shutdown.
    ///
    /// On startup: refresh, then reconcile if the monitor reports a
    /// pending sync (e.g. the process restarted with a non-empty queue).
    pub async fn run(mut self) {
        let mut conn_rx = self.connectivity.subscribe();
        let mut last = *conn_rx.borrow();

        self.refresh_and_notify().await;
        if last.is_online && self.has_pending_work() {
            self.reconcile_and_notify().await;
        }

        loop {
            tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(SyncCommand::Refresh) => self.refresh_and_notify().await,
                    Some(SyncCommand::Reconcile) => self.reconcile_and_notify().await,
                    Some(SyncCommand::Shutdown) | None => {
                        info!("sync engine shutting down");
                        break;
                    }
                },
                changed = conn_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    // The watch channel coalesces rapid flips, so branch
                    // on the observed state rather than the edge: a
                    // reconnect that raced past while a cycle was running
                    // still leaves sync_pending raised and must get its
                    // reconcile.
                    let state = *conn_rx.borrow();
                    if state.is_online && state.sync_pending {
                        self.reconcile_and_notify().await;
                    } else if state.is_online && !last.is_online {
                        self.refresh_and_notify().await;
                    }
                    // Going offline needs no action: the in-memory
                    // collections stay valid and reads keep serving them.
                    last = state;
                }
            }
        }
    }

    async fn refresh_and_notify(&self) {
        let from_cache = self.refresh().await;
        let _ = self
            .event_tx
            .send(SyncEvent::RefreshCompleted { from_cache })
            .await;
    }

    async fn reconcile_and_notify(&self) {
        let outcome = self.reconcile().await;
        let _ = self
            .event_tx
            .send(SyncEvent::ReconcileCompleted {
                applied: outcome.applied,
                failed: outcome.failed,
                dead_lettered: outcome.dead_lettered,
            })
            .await;
    }

    /// Refreshes every collection.
    ///
    /// Online: fetches all kinds concurrently; if any fetch fails, the
    /// in-memory state and cache are left untouched (stale data beats
    /// partial data). On full success the collections are overwritten and
    /// each snapshot is re-cached. Offline: loads the last cached
    /// snapshots. Returns true when data came from the cache.
    pub async fn refresh(&self) -> bool {
        if self.connectivity.is_online() {
            match self.fetch_all().await {
                Ok(fetched) => {
                    self.apply_fetched(fetched).await;
                    return false;
                }
                Err(e) => {
                    warn!("refresh fetch failed, keeping current state: {e}");
                    return false;
                }
            }
        }
        self.load_from_cache().await;
        true
    }

    async fn fetch_all(&self) -> SyncResult<Vec<(EntityKind, Vec<Record>)>> {
        let futures = EntityKind::ALL
            .iter()
            .map(|&kind| async move { (kind, self.remote.list(kind, &self.owner).await) });

        let mut fetched = Vec::with_capacity(EntityKind::ALL.len());
        for (kind, result) in join_all(futures).await {
            fetched.push((kind, result?));
        }
        Ok(fetched)
    }

    async fn apply_fetched(&self, fetched: Vec<(EntityKind, Vec<Record>)>) {
        let mut collections = self.collections.write().await;
        for (kind, records) in fetched {
            if kind.is_singleton() {
                let record = records.into_iter().next();
                let snapshot = record
                    .as_ref()
                    .and_then(|r| serde_json::to_value(r).ok())
                    .unwrap_or(Value::Null);
                self.store.put(Namespace::Cache, kind.cache_key(), &snapshot);
                collections.set_company_details(record);
            } else {
                if let Ok(snapshot) = serde_json::to_value(&records) {
                    self.store.put(Namespace::Cache, kind.cache_key(), &snapshot);
                }
                collections.set_records(kind, records);
            }
        }
        debug!("refreshed all collections from remote");
    }

    async fn load_from_cache(&self) {
        let mut collections = self.collections.write().await;
        for kind in EntityKind::ALL {
            let cached = self.store.get(Namespace::Cache, kind.cache_key());
            if kind.is_singleton() {
                let record = match cached {
                    Some(Value::Null) | None => None,
                    Some(value) => match serde_json::from_value(value) {
                        Ok(record) => Some(record),
                        Err(e) => {
                            warn!("discarding unreadable cached {kind} snapshot: {e}");
                            None
                        }
                    },
                };
                collections.set_company_details(record);
            } else {
                let records = match cached {
                    Some(value) => match serde_json::from_value(value) {
                        Ok(records) => records,
                        Err(e) => {
                            warn!("discarding unreadable cached {kind} snapshot: {e}");
                            Vec::new()
                        }
                    },
                    None => Vec::new(),
                };
                collections.set_records(kind, records);
            }
        }
        debug!("loaded all collections from cache");
    }

    /// Replays the pending mutation queue in FIFO order, then refreshes.
    ///
    /// Each entry is removed only after its remote call succeeds; a
    /// failed entry stays (or dead-letters once its retry budget is
    /// spent) and replay continues with the next one. The `sync_pending`
    /// flag clears whether or not every entry applied, so a poison entry
    /// cannot wedge the monitor.
    pub async fn reconcile(&self) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome::default();
        if !self.connectivity.is_online() {
            debug!("skipping reconcile while offline");
            return outcome;
        }

        let pending = match self.queue.pending() {
            Ok(pending) => pending,
            Err(e) => {
                warn!("could not read mutation queue: {e}");
                return outcome;
            }
        };

        if pending.is_empty() {
            self.connectivity.clear_sync_pending();
            return outcome;
        }

        info!("reconciling {} pending mutations", pending.len());
        for mutation in &pending {
            match self.apply_mutation(mutation).await {
                Ok(()) => {
                    if let Err(e) = self.queue.dequeue(mutation.id) {
                        warn!("applied mutation {} but could not dequeue: {e}", mutation.id);
                    }
                    outcome.applied += 1;
                }
                Err(e) => {
                    warn!(
                        "replay of {:?} {} failed: {e}",
                        mutation.action, mutation.kind
                    );
                    match self.queue.record_failure(mutation.id) {
                        Ok(loomworks_store::FailureDisposition::DeadLettered) => {
                            outcome.dead_lettered += 1;
                        }
                        Ok(loomworks_store::FailureDisposition::Retained) => {
                            outcome.failed += 1;
                        }
                        Err(e) => {
                            warn!("could not record failure for {}: {e}", mutation.id);
                            outcome.failed += 1;
                        }
                    }
                }
            }
        }

        self.connectivity.clear_sync_pending();
        self.refresh().await;
        outcome
    }

    async fn apply_mutation(&self, mutation: &QueuedMutation) -> SyncResult<()> {
        if mutation.kind.is_singleton() {
            return self.upsert_singleton(mutation).await;
        }

        match mutation.action {
            MutationAction::Insert => {
                self.remote
                    .insert(mutation.kind, &self.owner, &mutation.data)
                    .await?;
                Ok(())
            }
            MutationAction::Update => {
                let id = mutation.record_id().ok_or_else(|| {
                    SyncError::InvalidMutation("update with no record id".to_string())
                })?;
                let patch = strip_id(&mutation.data);
                self.remote
                    .update(mutation.kind, &self.owner, id, &patch)
                    .await
            }
            MutationAction::Delete => {
                let id = mutation.record_id().ok_or_else(|| {
                    SyncError::InvalidMutation("delete with no record id".to_string())
                })?;
                self.remote.delete(mutation.kind, &self.owner, id).await
            }
        }
    }

    /// Singleton kinds replay as insert-or-update: whatever row exists
    /// remotely wins the id, the queued fields win the content.
    async fn upsert_singleton(&self, mutation: &QueuedMutation) -> SyncResult<()> {
        let existing = self.remote.list(mutation.kind, &self.owner).await?;
        let fields = strip_id(&mutation.data);
        match existing.first() {
            Some(current) => {
                self.remote
                    .update(mutation.kind, &self.owner, &current.id, &fields)
                    .await
            }
            None => {
                self.remote
                    .insert(mutation.kind, &self.owner, &fields)
                    .await?;
                Ok(())
            }
        }
    }

    fn has_pending_work(&self) -> bool {
        self.connectivity.state().sync_pending
            || !self.queue.is_empty().unwrap_or(true)
    }
}

fn strip_id(data: &Value) -> Value {
    match data {
        Value::Object(map) => {
            let mut map = map.clone();
            map.remove("id");
            Value::Object(map)
        }
        other => other.clone(),
    }
}
