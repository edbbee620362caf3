//! DuckDB-backed local persistence for Loomworks.
//!
//! Everything the app needs to keep working without a network connection
//! lives here, partitioned into three namespaces of one durable key-value
//! table:
//!
//! - **Cache**: the last known snapshot of every entity collection
//! - **Queue**: the FIFO sequence of mutations awaiting remote replay
//! - **Drafts**: partially filled form buffers
//!
//! The store survives process restarts; reads and writes that fail are
//! logged and degrade gracefully (the offline cache is a convenience, not
//! a guarantee).

mod drafts;
mod error;
mod offline_store;
mod queue;

pub use drafts::DraftStore;
pub use error::{StoreError, StoreResult};
pub use offline_store::{Namespace, OfflineStore};
pub use queue::{FailureDisposition, MutationQueue, DEFAULT_MAX_ATTEMPTS};
