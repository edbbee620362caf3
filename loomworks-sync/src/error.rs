//! Sync error types.

use loomworks_store::StoreError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync and repository operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote store was unreachable or the call timed out. The fetch
    /// path falls back to cached data; the direct CRUD path propagates.
    #[error("network unreachable: {0}")]
    Connectivity(String),

    /// The remote store returned an explicit failure (validation,
    /// permission, conflict). Never retried automatically.
    #[error("remote store rejected the operation ({status}): {message}")]
    RemoteRejection { status: u16, message: String },

    /// The local persistent store failed a read or write.
    #[error("local persistence error: {0}")]
    Persistence(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A queued mutation could not be interpreted (e.g. a delete with no
    /// id). Such entries burn through their retry budget and dead-letter.
    #[error("malformed queued mutation: {0}")]
    InvalidMutation(String),

    #[error("sync engine not running")]
    EngineStopped,
}

impl SyncError {
    /// True when the failure came from an unreachable network rather than
    /// an explicit remote rejection.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, SyncError::Connectivity(_))
    }
}
