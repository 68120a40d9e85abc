//! # Snapshots
//!
//! Captures the persisted fields of every service and writes them back.
//!
//! ## Payload
//!
//! ```json
//! {
//!   "Hello-1": { "counter": 5 },
//!   "3-2":     { "page": 7 }
//! }
//! ```
//!
//! Each service is stored under `<name or id>-<version>`. Bumping a
//! service's version changes its key, so values saved by an older version
//! are ignored on restore instead of being decoded into a new layout.
//!
//! Restore assigns through each field's normal setter, so observable fields
//! publish change events as they are restored.

pub mod store;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::Descriptor;
use tracing::{debug, info, warn};

use crate::container::Container;

pub use store::{JsonFileStore, MemorySnapshotStore, Persistence, SnapshotStore, StoreError};

/// Persisted field values, grouped by service key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<String, BTreeMap<String, Value>>);

impl Snapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Values stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&BTreeMap<String, Value>> {
        self.0.get(key)
    }

    /// Store one field value under `key`.
    pub fn insert(&mut self, key: impl Into<String>, field: impl Into<String>, value: Value) {
        self.0
            .entry(key.into())
            .or_default()
            .insert(field.into(), value);
    }

    /// Service keys present in the snapshot.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of services stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Key a service is stored under, or `None` if it persists nothing.
#[must_use]
pub fn snapshot_key(descriptor: &Descriptor) -> Option<String> {
    if descriptor.persisted_keys.is_empty() {
        return None;
    }

    let base = match (&descriptor.name, descriptor.id) {
        (Some(name), _) => name.clone(),
        (None, Some(id)) => id.to_string(),
        (None, None) => return None,
    };
    Some(format!("{}-{}", base, descriptor.version))
}

/// Read every persisted field of every service.
pub fn capture(container: &Container) -> Snapshot {
    let mut snapshot = Snapshot::new();

    for entry in container.services() {
        let Some(key) = snapshot_key(entry.descriptor()) else {
            continue;
        };

        for field_key in &entry.descriptor().persisted_keys {
            let Some(field) = entry.service().field(field_key) else {
                continue;
            };
            match field.value() {
                Ok(value) => snapshot.insert(key.clone(), field_key.clone(), value),
                Err(e) => warn!(
                    service = entry.type_name(),
                    field = %field_key,
                    error = %e,
                    "Field not captured: value cannot be encoded"
                ),
            }
        }
    }

    debug!(services = snapshot.len(), "Snapshot captured");
    snapshot
}

/// Write `snapshot` back into the container.
///
/// Services whose key is absent, keys without a field, and values that do
/// not decode are skipped. Returns the number of fields assigned.
pub fn restore(container: &Container, snapshot: &Snapshot) -> usize {
    let mut assigned = 0usize;

    for entry in container.services() {
        let Some(key) = snapshot_key(entry.descriptor()) else {
            continue;
        };
        let Some(saved) = snapshot.get(&key) else {
            debug!(service = entry.type_name(), key = %key, "Nothing saved for service");
            continue;
        };

        for field_key in &entry.descriptor().persisted_keys {
            let Some(value) = saved.get(field_key) else {
                continue;
            };
            let Some(field) = entry.service().field(field_key) else {
                continue;
            };

            match field.assign(value.clone()) {
                Ok(_) => assigned += 1,
                Err(e) => warn!(
                    service = entry.type_name(),
                    field = %field_key,
                    error = %e,
                    "Saved value skipped: cannot be decoded"
                ),
            }
        }
    }

    info!(fields = assigned, "Snapshot restored");
    assigned
}
