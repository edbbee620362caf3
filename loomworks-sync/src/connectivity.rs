//! Connectivity monitor.
//!
//! Tracks the runtime-reported online/offline signal and raises the
//! `sync_pending` flag on every offline-to-online edge. No polling: if the
//! runtime never reports a transition, the state never changes.

use tokio::sync::watch;
use tracing::debug;

/// Current connectivity, as seen by the rest of the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityState {
    pub is_online: bool,
    /// Raised on reconnect, cleared only after a full queue-drain-and-
    /// refetch cycle completes.
    pub sync_pending: bool,
}

/// Edge-triggered online/offline tracker.
///
/// Clones share the same state. The engine subscribes to the watch
/// channel; the embedding runtime pushes transitions via [`set_online`].
///
/// [`set_online`]: ConnectivityMonitor::set_online
#[derive(Clone)]
pub struct ConnectivityMonitor {
    tx: watch::Sender<ConnectivityState>,
}

impl ConnectivityMonitor {
    /// Creates a monitor with the runtime's connectivity at startup.
    pub fn new(initially_online: bool) -> Self {
        let (tx, _rx) = watch::channel(ConnectivityState {
            is_online: initially_online,
            sync_pending: false,
        });
        Self { tx }
    }

    /// Pure read of the current state.
    pub fn state(&self) -> ConnectivityState {
        *self.tx.borrow()
    }

    pub fn is_online(&self) -> bool {
        self.tx.borrow().is_online
    }

    /// Records a runtime connectivity transition.
    ///
    /// Going from offline to online sets `sync_pending` exactly once per
    /// edge; repeated calls while already online do nothing. Going
    /// offline never touches `sync_pending`.
    pub fn set_online(&self, online: bool) {
        self.tx.send_if_modified(|state| {
            if online && !state.is_online {
                debug!("connectivity: offline -> online, sync pending");
                state.is_online = true;
                state.sync_pending = true;
                true
            } else if !online && state.is_online {
                debug!("connectivity: online -> offline");
                state.is_online = false;
                true
            } else {
                false
            }
        });
    }

    /// Clears the pending flag. Called by the sync engine once a full
    /// drain-and-refetch cycle has completed.
    pub fn clear_sync_pending(&self) {
        self.tx.send_if_modified(|state| {
            if state.sync_pending {
                state.sync_pending = false;
                true
            } else {
                false
            }
        });
    }

    /// Subscribes to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.tx.subscribe()
    }
}
