#![allow(dead_code)]

use async_trait::async_trait;
use loomworks_store::{MutationQueue, OfflineStore};
use loomworks_sync::{
    create_data_service, DataService, RemoteStore, SyncConfig, SyncEngine, SyncError, SyncEvent,
    SyncResult,
};
use loomworks_types::{EntityKind, OwnerId, Record};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// In-memory remote store with scriptable failures and an operation log.
#[derive(Default)]
pub struct MockRemote {
    rows: Mutex<HashMap<&'static str, Vec<Record>>>,
    ops: Mutex<Vec<String>>,
    failures: Mutex<Vec<(String, &'static str)>>,
    delays: Mutex<Vec<(String, &'static str, Duration)>>,
    next_id: AtomicU64,
}

impl MockRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed(&self, kind: EntityKind, records: Vec<Record>) {
        self.rows.lock().unwrap().insert(kind.table_name(), records);
    }

    /// Makes every `action` call against `kind` fail as unreachable.
    pub fn fail_on(&self, action: &str, kind: EntityKind) {
        self.failures
            .lock()
            .unwrap()
            .push((action.to_string(), kind.table_name()));
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    /// Makes every `action` call against `kind` sleep before answering,
    /// to hold the engine inside a cycle.
    pub fn delay_on(&self, action: &str, kind: EntityKind, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .push((action.to_string(), kind.table_name(), delay));
    }

    /// Operations seen so far, as "action table" strings in call order.
    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().unwrap().clone()
    }

    pub fn rows(&self, kind: EntityKind) -> Vec<Record> {
        self.rows
            .lock()
            .unwrap()
            .get(kind.table_name())
            .cloned()
            .unwrap_or_default()
    }

    async fn maybe_delay(&self, action: &str, kind: EntityKind) {
        let table = kind.table_name();
        let delay = self
            .delays
            .lock()
            .unwrap()
            .iter()
            .find(|(a, t, _)| a == action && *t == table)
            .map(|(_, _, d)| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check(&self, action: &str, kind: EntityKind) -> SyncResult<()> {
        let table = kind.table_name();
        let failing = self
            .failures
            .lock()
            .unwrap()
            .iter()
            .any(|(a, t)| a == action && *t == table);
        if failing {
            return Err(SyncError::Connectivity(format!(
                "simulated outage: {action} {table}"
            )));
        }
        self.ops.lock().unwrap().push(format!("{action} {table}"));
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MockRemote {
    async fn list(&self, kind: EntityKind, _owner: &OwnerId) -> SyncResult<Vec<Record>> {
        self.maybe_delay("list", kind).await;
        self.check("list", kind)?;
        Ok(self.rows(kind))
    }

    async fn insert(
        &self,
        kind: EntityKind,
        _owner: &OwnerId,
        fields: &Value,
    ) -> SyncResult<Record> {
        self.maybe_delay("insert", kind).await;
        self.check("insert", kind)?;
        let id = format!("srv-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let record = Record::with_id(id, fields.clone());
        self.rows
            .lock()
            .unwrap()
            .entry(kind.table_name())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        kind: EntityKind,
        _owner: &OwnerId,
        id: &str,
        patch: &Value,
    ) -> SyncResult<()> {
        self.maybe_delay("update", kind).await;
        self.check("update", kind)?;
        let mut rows = self.rows.lock().unwrap();
        if let Some(record) = rows
            .entry(kind.table_name())
            .or_default()
            .iter_mut()
            .find(|r| r.id == id)
        {
            record.merge(patch);
        }
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, _owner: &OwnerId, id: &str) -> SyncResult<()> {
        self.maybe_delay("delete", kind).await;
        self.check("delete", kind)?;
        self.rows
            .lock()
            .unwrap()
            .entry(kind.table_name())
            .or_default()
            .retain(|r| r.id != id);
        Ok(())
    }
}

pub struct Harness {
    pub service: DataService,
    pub events: mpsc::Receiver<SyncEvent>,
    pub engine: SyncEngine,
    pub remote: Arc<MockRemote>,
    pub store: OfflineStore,
    pub queue: MutationQueue,
}

pub fn owner() -> OwnerId {
    OwnerId::new("owner-1")
}

pub fn harness(initially_online: bool) -> Harness {
    let store = OfflineStore::open_in_memory().expect("in-memory store");
    harness_with_store(store, initially_online)
}

pub fn harness_with_store(store: OfflineStore, initially_online: bool) -> Harness {
    harness_with_config(store, initially_online, SyncConfig::default())
}

pub fn harness_with_config(
    store: OfflineStore,
    initially_online: bool,
    config: SyncConfig,
) -> Harness {
    let remote = MockRemote::new();
    let queue = MutationQueue::with_max_attempts(store.clone(), config.max_mutation_attempts);
    let (service, events, engine) = create_data_service(
        store.clone(),
        Arc::clone(&remote) as Arc<dyn RemoteStore>,
        owner(),
        initially_online,
        &config,
    );

    Harness {
        service,
        events,
        engine,
        remote,
        store,
        queue,
    }
}

pub fn mill(id: &str, name: &str) -> Record {
    Record::with_id(id, serde_json::json!({ "name": name }))
}
