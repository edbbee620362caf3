//! Top-level wiring of the data layer.

use loomworks_store::{DraftStore, MutationQueue, OfflineStore};
use loomworks_types::OwnerId;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::collections::{Collections, SharedCollections};
use crate::config::SyncConfig;
use crate::connectivity::ConnectivityMonitor;
use crate::engine::{create_sync_engine, SyncEngine, SyncEngineHandle, SyncEvent};
use crate::remote::RemoteStore;
use crate::repository::Repository;

/// Everything an embedding application needs from the data core.
#[derive(Clone)]
pub struct DataService {
    pub repository: Repository,
    pub drafts: DraftStore,
    pub connectivity: ConnectivityMonitor,
    pub sync: SyncEngineHandle,
    collections: SharedCollections,
}

impl DataService {
    /// Shared in-memory collections, for callers that need direct reads.
    pub fn collections(&self) -> SharedCollections {
        Arc::clone(&self.collections)
    }
}

/// Wires the store, queue, monitor, repository, and sync engine together.
///
/// The returned [`SyncEngine`] must be driven, typically by spawning
/// [`SyncEngine::run`] on the runtime; the service's handle and the
/// event receiver talk to that task.
pub fn create_data_service(
    store: OfflineStore,
    remote: Arc<dyn RemoteStore>,
    owner: OwnerId,
    initially_online: bool,
    config: &SyncConfig,
) -> (DataService, mpsc::Receiver<SyncEvent>, SyncEngine) {
    let collections = Collections::shared();
    let connectivity = ConnectivityMonitor::new(initially_online);
    let queue = MutationQueue::with_max_attempts(store.clone(), config.max_mutation_attempts);
    let drafts = DraftStore::new(store.clone());

    let repository = Repository::new(
        Arc::clone(&collections),
        store.clone(),
        queue.clone(),
        connectivity.clone(),
        Arc::clone(&remote),
        owner.clone(),
    );

    let (handle, event_rx, engine) = create_sync_engine(
        Arc::clone(&collections),
        store,
        queue,
        remote,
        connectivity.clone(),
        owner,
        config,
    );

    let service = DataService {
        repository,
        drafts,
        connectivity,
        sync: handle,
        collections,
    };

    (service, event_rx, engine)
}
