//! # Runtime End to End
//!
//! ## Properties Tested:
//!
//! 1. **Restart**: state saved at shutdown is restored by the next run
//! 2. **Timers and observers**: timer ticks reach an observer as distinct changes
//! 3. **Configuration**: disabled timers never fire

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;
    use stitch_runtime::{
        Args, DescriptorPatch, Field, LifecycleFuture, ObservableCell, Observer, RuntimeConfig,
        Service, ServiceRegistry, ServiceRuntime, TimerOptions, Wire, Wiring,
    };

    use crate::fixtures::{cyclic_registry, Hello};

    /// Counts `tick` calls from a 100ms timer and pokes [`Hello`] on start.
    #[derive(Debug)]
    struct Ticker {
        ticks: ObservableCell<u64>,
        hello: Wire<Hello>,
    }

    impl Service for Ticker {
        fn metadata() -> DescriptorPatch {
            DescriptorPatch::new()
                .name("Ticker")
                .order(-1)
                .observable("ticks")
                .persisted("ticks")
                .timer("tick", 100, TimerOptions::default())
        }

        fn construct(wiring: &mut Wiring<'_>) -> anyhow::Result<Self> {
            Ok(Self {
                ticks: ObservableCell::new(0),
                hello: wiring.wire::<Hello>()?,
            })
        }

        fn field(&self, key: &str) -> Option<&dyn Field> {
            match key {
                "ticks" => Some(&self.ticks),
                _ => None,
            }
        }

        fn invoke(self: Arc<Self>, method: &str, _args: Args) -> Option<LifecycleFuture> {
            match method {
                "created" => Some(Box::pin(async move {
                    self.hello.get()?.counter.update(|n| n + 1);
                    Ok::<_, anyhow::Error>(())
                })),
                "tick" => Some(Box::pin(async move {
                    self.ticks.update(|n| n + 1);
                    Ok::<_, anyhow::Error>(())
                })),
                _ => None,
            }
        }
    }

    fn registry() -> ServiceRegistry {
        let mut registry = cyclic_registry(true);
        registry.register::<Ticker>();
        registry
    }

    fn config(path: &Path, start_timers: bool) -> RuntimeConfig {
        RuntimeConfig {
            snapshot_path: path.to_path_buf(),
            start_timers,
            ..RuntimeConfig::default()
        }
    }

    // =========================================================================
    // RESTART
    // =========================================================================

    #[tokio::test]
    async fn test_state_carries_over_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");

        for run in 1..=3 {
            let mut runtime = ServiceRuntime::new(config(&path, false), &registry()).unwrap();
            runtime.start().await.unwrap();

            let hello = runtime.container().pick::<Hello>().unwrap();
            assert_eq!(hello.counter.get(), run);

            runtime.shutdown().await.unwrap();
        }

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["Hello-1"]["counter"], json!(3));
        assert_eq!(saved["Ticker-1"]["ticks"], json!(0));
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = RuntimeConfig {
            startup_phase: String::new(),
            ..RuntimeConfig::default()
        };

        assert!(ServiceRuntime::new(config, &registry()).is_err());
    }

    // =========================================================================
    // TIMERS AND OBSERVERS
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_timer_ticks_reach_observer() {
        let dir = tempfile::tempdir().unwrap();
        let mut runtime =
            ServiceRuntime::new(config(&dir.path().join("snapshot.json"), true), &registry())
                .unwrap();
        let ticker = runtime.container().id_of::<Ticker>().unwrap();
        let mut observer = Observer::new(runtime.container(), &[ticker]);

        runtime.start().await.unwrap();
        assert!(runtime.timers_running());

        tokio::time::sleep(Duration::from_millis(350)).await;

        let mut seen = Vec::new();
        while let Some(event) = observer.try_recv() {
            assert_eq!(event.service_id, ticker);
            assert_eq!(event.property, "ticks");
            seen.push(event.value);
        }
        assert_eq!(seen, vec![json!(1), json!(2), json!(3)]);

        runtime.shutdown().await.unwrap();
        assert!(!runtime.timers_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_timers_never_fire() {
        let dir = tempfile::tempdir().unwrap();
        let mut runtime =
            ServiceRuntime::new(config(&dir.path().join("snapshot.json"), false), &registry())
                .unwrap();

        runtime.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert!(!runtime.timers_running());
        assert_eq!(runtime.container().pick::<Ticker>().unwrap().ticks.get(), 0);
        runtime.shutdown().await.unwrap();
    }
}
