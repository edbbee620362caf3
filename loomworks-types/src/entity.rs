//! Entity kinds, generic records, and identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

/// The business entity types managed by the data layer.
///
/// `CompanyDetails` is a singleton per owner; every other kind is a
/// collection of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Mill,
    Product,
    Customer,
    PurchaseOrder,
    QualityRecord,
    CompanyDetails,
}

impl EntityKind {
    /// Every kind, in the fixed order used for fetch and cache refresh.
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Mill,
        EntityKind::Product,
        EntityKind::Customer,
        EntityKind::PurchaseOrder,
        EntityKind::QualityRecord,
        EntityKind::CompanyDetails,
    ];

    /// Remote collection name for this kind.
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::Mill => "mills",
            EntityKind::Product => "products",
            EntityKind::Customer => "customers",
            EntityKind::PurchaseOrder => "purchase_orders",
            EntityKind::QualityRecord => "quality_records",
            EntityKind::CompanyDetails => "company_details",
        }
    }

    /// Key the collection snapshot is cached under in the local store.
    pub fn cache_key(&self) -> &'static str {
        match self {
            EntityKind::Mill => "mills",
            EntityKind::Product => "products",
            EntityKind::Customer => "customers",
            EntityKind::PurchaseOrder => "purchaseOrders",
            EntityKind::QualityRecord => "qualityRecords",
            EntityKind::CompanyDetails => "companyDetails",
        }
    }

    /// True for kinds with exactly one record per owner.
    pub fn is_singleton(&self) -> bool {
        matches!(self, EntityKind::CompanyDetails)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table_name())
    }
}

/// A generic entity record: a unique id plus named scalar fields.
///
/// Serializes flat, with `id` inline alongside the fields, matching the
/// remote store's row shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl Record {
    /// Builds a record from a JSON object of fields, staging it under a
    /// freshly generated client-side id.
    pub fn staged(fields: serde_json::Value) -> Self {
        Self {
            id: next_local_id(),
            fields: into_fields(fields),
        }
    }

    /// Builds a record with an explicit id.
    pub fn with_id(id: impl Into<String>, fields: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            fields: into_fields(fields),
        }
    }

    /// Applies a partial-field JSON object in place. The `id` never changes,
    /// even if the patch carries one.
    pub fn merge(&mut self, patch: &serde_json::Value) {
        if let Some(obj) = patch.as_object() {
            for (key, value) in obj {
                if key == "id" {
                    continue;
                }
                self.fields.insert(key.clone(), value.clone());
            }
        }
    }

    /// Returns a string field by name, if present.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(|v| v.as_str())
    }
}

fn into_fields(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    match value {
        serde_json::Value::Object(mut map) => {
            map.remove("id");
            map
        }
        _ => serde_json::Map::new(),
    }
}

/// Last id handed out, so two calls in the same millisecond still increase.
static LAST_LOCAL_ID: AtomicI64 = AtomicI64::new(0);

/// Generates a client-side record id: a timestamp-derived decimal token.
///
/// Used when a record is created before the remote store has assigned an
/// authoritative id. Monotonically increasing within a process.
pub fn next_local_id() -> String {
    loop {
        let last = LAST_LOCAL_ID.load(Ordering::Relaxed);
        let now = chrono::Utc::now().timestamp_millis();
        let candidate = now.max(last + 1);
        if LAST_LOCAL_ID
            .compare_exchange(last, candidate, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            return candidate.to_string();
        }
    }
}

/// Opaque owner identity scoping all remote reads and writes.
///
/// Obtained from the authentication layer; the data core only forwards it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
