//! # Snapshot Round Trips
//!
//! ## Properties Tested:
//!
//! 1. **Round trip**: a saved counter comes back after a rebuild, firing once
//! 2. **Versioning**: bumping the version discards values saved under the old one
//! 3. **File store**: snapshots survive a rebuild through `JsonFileStore`

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use stitch_runtime::{
        Container, DescriptorPatch, JsonFileStore, MemorySnapshotStore, Persistence, ServiceId,
        Snapshot, SnapshotStore,
    };

    use crate::fixtures::{cyclic_registry, Hello, Test};

    fn hello_events(container: &Container) -> Arc<Mutex<Vec<Value>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let hello = container.id_of::<Hello>().unwrap();
        let _subscription = container.listen(move |id: ServiceId, key, value| {
            if id == hello && key == "counter" {
                sink.lock().push(value.clone());
            }
        });
        events
    }

    // =========================================================================
    // IN MEMORY
    // =========================================================================

    #[test]
    fn test_counter_round_trips_and_fires_once() {
        let registry = cyclic_registry(true);

        let first = Container::build(&registry).unwrap();
        first.pick::<Hello>().unwrap().counter.set(7);
        let snapshot = first.snapshot();
        assert_eq!(snapshot.get("Hello-1").unwrap()["counter"], json!(7));

        let second = Container::build(&registry).unwrap();
        let events = hello_events(&second);
        assert_eq!(second.restore(&snapshot), 1);

        assert_eq!(second.pick::<Hello>().unwrap().counter.get(), 7);
        assert_eq!(*events.lock(), vec![json!(7)]);
    }

    #[test]
    fn test_unpersisted_services_are_not_captured() {
        let container = Container::build(&cyclic_registry(true)).unwrap();
        container.pick::<Test>().unwrap().page.set(4);

        let snapshot = container.snapshot();
        assert_eq!(snapshot.keys().collect::<Vec<_>>(), vec!["Hello-1"]);
    }

    #[test]
    fn test_version_bump_ignores_old_values() {
        let old = Container::build(&cyclic_registry(true)).unwrap();
        old.pick::<Hello>().unwrap().counter.set(7);
        let snapshot = old.snapshot();

        let mut registry = cyclic_registry(true);
        registry.register_with::<Hello>(DescriptorPatch::new().version(2));
        let bumped = Container::build(&registry).unwrap();
        let events = hello_events(&bumped);

        assert_eq!(bumped.restore(&snapshot), 0);
        assert_eq!(bumped.pick::<Hello>().unwrap().counter.get(), 0);
        assert!(events.lock().is_empty());
        assert!(bumped.snapshot().get("Hello-2").is_some());
    }

    #[tokio::test]
    async fn test_persistence_with_memory_store() {
        let registry = cyclic_registry(false);
        let store = MemorySnapshotStore::new();

        let first = Container::build(&registry).unwrap();
        first.pick::<Hello>().unwrap().counter.set(12);
        let persistence = Persistence::new(first, store);
        persistence.save().await.unwrap();

        let saved = persistence.store().current().unwrap();
        let second = Container::build(&registry).unwrap();
        let restored = Persistence::new(second.clone(), MemorySnapshotStore::with_snapshot(saved));

        assert_eq!(restored.restore().await, 1);
        assert_eq!(second.pick::<Hello>().unwrap().counter.get(), 12);
    }

    // =========================================================================
    // FILE STORE
    // =========================================================================

    #[tokio::test]
    async fn test_file_store_survives_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("snapshot.json");
        let registry = cyclic_registry(true);

        let first = Container::build(&registry).unwrap();
        first.pick::<Hello>().unwrap().counter.set(-3);
        Persistence::new(first, JsonFileStore::new(path.clone()))
            .save()
            .await
            .unwrap();
        assert!(path.exists());

        let second = Container::build(&registry).unwrap();
        let persistence = Persistence::new(second.clone(), JsonFileStore::new(path.clone()));
        assert_eq!(persistence.restore().await, 1);
        assert_eq!(second.pick::<Hello>().unwrap().counter.get(), -3);
    }

    #[tokio::test]
    async fn test_corrupt_file_restores_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let container = Container::build(&cyclic_registry(true)).unwrap();
        let persistence = Persistence::new(container.clone(), JsonFileStore::new(path.clone()));

        assert!(persistence.store().load().await.is_err());
        assert_eq!(persistence.restore().await, 0);
        assert_eq!(container.pick::<Hello>().unwrap().counter.get(), 0);
    }

    #[tokio::test]
    async fn test_missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("absent.json"));

        assert!(store.load().await.unwrap().is_none());
    }

    #[test]
    fn test_json_layout_is_stable() {
        let mut snapshot = Snapshot::new();
        snapshot.insert("Hello-1", "counter", json!(7));

        let parsed: Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(parsed, json!({ "Hello-1": { "counter": 7 } }));
    }
}
