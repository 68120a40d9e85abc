//! # Stitch Runtime
//!
//! Demo host for the service container.
//!
//! ## Services
//!
//! ```text
//!   Counter ──wire──→ Pager
//!      ↑                │
//!      └──────wire──────┘
//! ```
//!
//! - `Counter` (order 0) counts ticks from a one-second timer and persists the
//!   count. Every tenth tick it turns the pager's page.
//! - `Pager` (order 10) keeps the current page and reads the counter when it
//!   starts.
//!
//! Both fields are observable; an [`Observer`] logs every change. State is
//! restored from and saved to the snapshot file, so the count carries over
//! between runs.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from the environment
//! 2. Install the log subscriber
//! 3. Register services and build the container
//! 4. Restore state, run `created`, start timers
//! 5. Wait for Ctrl+C, then run `destroyed` and save state

use std::sync::Arc;

use anyhow::{Context, Result};
use futures::StreamExt;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use stitch_runtime::{
    Args, DescriptorPatch, Field, LifecycleFuture, ObservableCell, Observer, RuntimeConfig,
    Service, ServiceRegistry, ServiceRuntime, TimerOptions, Wire, Wiring,
};

/// Ticks between page turns.
const TICKS_PER_PAGE: u64 = 10;

struct Counter {
    ticks: ObservableCell<u64>,
    pager: Wire<Pager>,
}

impl Counter {
    fn tick(&self) -> Result<()> {
        let mut turn = false;
        self.ticks.update(|n| {
            turn = (n + 1) % TICKS_PER_PAGE == 0;
            n + 1
        });
        if turn {
            self.pager.get()?.turn();
        }
        Ok(())
    }
}

impl Service for Counter {
    fn metadata() -> DescriptorPatch {
        DescriptorPatch::new()
            .name("Counter")
            .observable("ticks")
            .persisted("ticks")
            .timer("tick", 1_000, TimerOptions::default())
    }

    fn construct(wiring: &mut Wiring<'_>) -> Result<Self> {
        Ok(Self {
            ticks: ObservableCell::new(0),
            pager: wiring.wire::<Pager>()?,
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
                info!(ticks = self.ticks.get(), "[Counter] Created");
                Ok::<_, anyhow::Error>(())
            })),
            "tick" => Some(Box::pin(async move { self.tick() })),
            "destroyed" => Some(Box::pin(async move {
                info!(ticks = self.ticks.get(), "[Counter] Destroyed");
                Ok::<_, anyhow::Error>(())
            })),
            _ => None,
        }
    }
}

struct Pager {
    page: ObservableCell<u32>,
    counter: Wire<Counter>,
}

impl Pager {
    fn turn(&self) {
        self.page.update(|page| page + 1);
    }
}

impl Service for Pager {
    fn metadata() -> DescriptorPatch {
        DescriptorPatch::new()
            .name("Pager")
            .order(10)
            .observable("page")
            .persisted("page")
    }

    fn construct(wiring: &mut Wiring<'_>) -> Result<Self> {
        Ok(Self {
            page: ObservableCell::new(1),
            counter: wiring.wire::<Counter>()?,
        })
    }

    fn field(&self, key: &str) -> Option<&dyn Field> {
        match key {
            "page" => Some(&self.page),
            _ => None,
        }
    }

    fn invoke(self: Arc<Self>, method: &str, _args: Args) -> Option<LifecycleFuture> {
        match method {
            "created" => Some(Box::pin(async move {
                let counter = self.counter.get()?;
                info!(
                    page = self.page.get(),
                    ticks = counter.ticks.get(),
                    "[Pager] Created"
                );
                Ok::<_, anyhow::Error>(())
            })),
            _ => None,
        }
    }
}

fn registry() -> ServiceRegistry {
    let mut registry = ServiceRegistry::new();
    registry.register::<Counter>();
    registry.register::<Pager>();
    registry
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = RuntimeConfig::from_env();

    // Initialize logging
    let filter = EnvFilter::try_new(&config.log_level)
        .with_context(|| format!("Invalid log filter `{}`", config.log_level))?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install log subscriber")?;

    // Build and start the runtime
    let mut runtime = ServiceRuntime::new(config, &registry())?;
    runtime.start().await?;

    // Log every change
    let mut observer = Observer::new(runtime.container(), &[]);
    let watcher = tokio::spawn(async move {
        while let Some(event) = observer.next().await {
            info!(
                service = %event.service_id,
                property = %event.property,
                value = %event.value,
                "Field changed"
            );
        }
    });

    info!("Runtime is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    watcher.abort();
    runtime.shutdown().await?;

    Ok(())
}
