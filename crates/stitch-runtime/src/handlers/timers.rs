//! # Timer Scheduler
//!
//! Drives the periodic calls declared with [`DescriptorPatch::timer`].
//!
//! Each declared timer gets its own task that calls the timer's method on
//! the declaring service every `interval_ms`:
//!
//! ```text
//! t=0        interval     2×interval   3×interval
//!  │            │             │             │
//!  start ───────┴── call ─────┴── call ─────┴── call ──→ ... until limit/shutdown
//! ```
//!
//! - `call_once` fires once after the first interval.
//! - `count = n` stops after `n` calls.
//! - `wait_for_call` awaits each call before the next tick; ticks that pass
//!   meanwhile are skipped. Otherwise every call is spawned and ticks never
//!   wait.
//!
//! A failing or panicking call is logged and the timer keeps going.
//!
//! [`DescriptorPatch::timer`]: shared_types::DescriptorPatch::timer

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde_json::Value;
use shared_types::{ServiceId, TimerSpec};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::container::Container;
use crate::service::{Args, LifecycleFuture, Service};

/// A timer bound to its service.
struct TimerTask {
    service_id: ServiceId,
    type_name: &'static str,
    service: Arc<dyn Service>,
    spec: TimerSpec,
}

/// Running timers of one container.
///
/// Dropping the scheduler without calling [`shutdown`](Self::shutdown) also
/// stops every timer at its next tick.
pub struct TimerScheduler {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl TimerScheduler {
    /// Spawn one task per timer declared in the container's descriptors.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(container: &Container) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut tasks = Vec::new();

        for entry in container.services() {
            for spec in &entry.descriptor().timers {
                debug!(
                    service = entry.type_name(),
                    id = %entry.id(),
                    method = %spec.key,
                    interval_ms = spec.interval_ms,
                    "Starting timer"
                );
                let task = TimerTask {
                    service_id: entry.id(),
                    type_name: entry.type_name(),
                    service: Arc::clone(entry.service()),
                    spec: spec.clone(),
                };
                tasks.push(tokio::spawn(run_timer(task, shutdown_rx.clone())));
            }
        }

        info!(timers = tasks.len(), "Timers started");
        Self { shutdown_tx, tasks }
    }

    /// Number of timers started.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Stop every timer and wait for its task to exit.
    ///
    /// Calls spawned by timers without `wait_for_call` are not awaited.
    pub async fn shutdown(self) {
        if self.shutdown_tx.send(true).is_err() {
            debug!("All timers already finished");
        }
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Timer task ended abnormally");
            }
        }
        info!("Timers stopped");
    }
}

async fn run_timer(task: TimerTask, mut shutdown: watch::Receiver<bool>) {
    let period = Duration::from_millis(task.spec.interval_ms.max(1));
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let limit = task.spec.options.limit();
    let args: Args = Arc::from(Vec::<Value>::new());
    let mut fired = 0u32;

    while limit.map_or(true, |limit| fired < limit) {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => return,
        }

        let Some(call) = Arc::clone(&task.service).invoke(&task.spec.key, Arc::clone(&args)) else {
            warn!(
                service = task.type_name,
                id = %task.service_id,
                method = %task.spec.key,
                "Timer method not defined, stopping timer"
            );
            return;
        };
        fired += 1;

        if task.spec.options.wait_for_call {
            tokio::select! {
                _ = report(call, task.service_id, task.type_name, task.spec.key.clone()) => {}
                _ = shutdown.changed() => return,
            }
        } else {
            tokio::spawn(report(call, task.service_id, task.type_name, task.spec.key.clone()));
        }
    }

    debug!(
        service = task.type_name,
        method = %task.spec.key,
        calls = fired,
        "Timer reached its limit"
    );
}

async fn report(
    call: LifecycleFuture,
    service_id: ServiceId,
    type_name: &'static str,
    method: String,
) {
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(
            service = type_name,
            id = %service_id,
            method = %method,
            error = %e,
            "Timer call failed"
        ),
        Err(_) => warn!(
            service = type_name,
            id = %service_id,
            method = %method,
            "Timer call panicked"
        ),
    }
}
