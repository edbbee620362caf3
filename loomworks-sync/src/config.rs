//! Sync layer configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the sync engine and remote store client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL for the remote row store (e.g., "https://api.loomworks.app").
    pub api_base_url: String,

    /// API key sent with every remote request.
    pub api_key: String,

    /// Per-request timeout so one unreachable call cannot wedge a sync
    /// cycle (seconds).
    pub request_timeout_secs: u64,

    /// Failed replay attempts before a queued mutation is dead-lettered.
    pub max_mutation_attempts: u32,

    /// Engine command channel capacity.
    pub command_buffer: usize,

    /// Engine event channel capacity.
    pub event_buffer: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.loomworks.app".to_string(),
            api_key: String::new(),
            request_timeout_secs: 30,
            max_mutation_attempts: 5,
            command_buffer: 32,
            event_buffer: 64,
        }
    }
}

impl SyncConfig {
    /// Creates a config pointed at a local test server.
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: base_url.into(),
            api_key: "test-key".to_string(),
            request_timeout_secs: 5,
            ..Self::default()
        }
    }
}
