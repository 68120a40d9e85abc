//! # Service Runtime
//!
//! Host that takes a registry through a full run.
//!
//! ## Startup Sequence
//!
//! 1. Validate configuration
//! 2. Build the container
//! 3. Restore persisted fields from the snapshot file
//! 4. Invoke the startup phase in order
//! 5. Start declared timers (if enabled)
//!
//! ## Shutdown Sequence
//!
//! 1. Stop timers
//! 2. Invoke the shutdown phase in order
//! 3. Save the snapshot file

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::container::{Container, RuntimeConfig};
use crate::handlers::TimerScheduler;
use crate::registry::ServiceRegistry;
use crate::snapshot::{JsonFileStore, Persistence};

/// A built container plus everything that drives it.
pub struct ServiceRuntime {
    config: RuntimeConfig,
    container: Container,
    persistence: Persistence<JsonFileStore>,
    timers: Option<TimerScheduler>,
}

impl ServiceRuntime {
    /// Validate `config` and build every service in `registry`.
    pub fn new(config: RuntimeConfig, registry: &ServiceRegistry) -> Result<Self> {
        config.validate().context("Invalid runtime configuration")?;
        let container = Container::build(registry).context("Failed to build service container")?;
        let persistence = Persistence::new(
            container.clone(),
            JsonFileStore::new(config.snapshot_path.clone()),
        );

        Ok(Self {
            config,
            container,
            persistence,
            timers: None,
        })
    }

    /// Restore state, run the startup phase and start timers.
    pub async fn start(&mut self) -> Result<()> {
        info!("===========================================");
        info!("  Stitch Service Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let restored = self.persistence.restore().await;
        info!(fields = restored, path = %self.config.snapshot_path.display(), "State restored");

        self.container
            .ordered_invoke(&self.config.startup_phase, vec![])
            .await
            .with_context(|| format!("Startup phase `{}` failed", self.config.startup_phase))?;

        if self.config.start_timers {
            self.timers = Some(TimerScheduler::start(&self.container));
        } else {
            info!("Timers disabled by configuration");
        }

        info!(services = self.container.len(), "Runtime started");
        Ok(())
    }

    /// Stop timers, run the shutdown phase and save state.
    ///
    /// State is saved even if the shutdown phase fails; the phase error is
    /// returned afterwards.
    pub async fn shutdown(&mut self) -> Result<()> {
        info!("Initiating graceful shutdown...");

        if let Some(timers) = self.timers.take() {
            timers.shutdown().await;
        }

        let phase = self
            .container
            .ordered_invoke(&self.config.shutdown_phase, vec![])
            .await;
        if let Err(e) = &phase {
            warn!(error = %e, "Shutdown phase failed, saving state anyway");
        }

        self.persistence
            .save()
            .await
            .context("Failed to save snapshot")?;

        phase.with_context(|| format!("Shutdown phase `{}` failed", self.config.shutdown_phase))?;
        info!("Shutdown complete");
        Ok(())
    }

    #[must_use]
    pub fn container(&self) -> &Container {
        &self.container
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Whether timers are currently running.
    #[must_use]
    pub fn timers_running(&self) -> bool {
        self.timers.is_some()
    }
}
