//! Offline-first sync engine for Loomworks.
//!
//! Keeps the in-memory entity collections consistent with the remote
//! row store whether or not the device has connectivity:
//!
//! - **Connectivity monitor**: edge-triggered online/offline state with
//!   a `sync_pending` flag raised on every reconnect
//! - **Remote store contract**: owner-scoped list/insert/update/delete
//!   over named collections, plus a reqwest implementation
//! - **Sync engine**: fetch and cache when online, load from cache when
//!   offline, and replay the durable mutation queue in FIFO order after
//!   a reconnect
//! - **Entity repository**: one generic CRUD facade over every entity
//!   kind, optimistic in memory, writing through or enqueueing depending
//!   on connectivity
//!
//! All Fetching/Reconciling transitions are serialized through a single
//! orchestration task; concurrent triggers coalesce instead of racing on
//! the cache keys.

pub mod api_client;
pub mod collections;
pub mod config;
pub mod connectivity;
pub mod engine;
pub mod error;
pub mod remote;
pub mod repository;
pub mod service;

pub use api_client::RestRowStore;
pub use collections::{Collections, SharedCollections};
pub use config::SyncConfig;
pub use connectivity::{ConnectivityMonitor, ConnectivityState};
pub use engine::{
    create_sync_engine, ReconcileOutcome, SyncCommand, SyncEngine, SyncEngineHandle, SyncEvent,
};
pub use error::{SyncError, SyncResult};
pub use remote::RemoteStore;
pub use repository::Repository;
pub use service::{create_data_service, DataService};
