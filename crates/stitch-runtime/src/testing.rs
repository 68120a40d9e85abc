//! Services shared by the unit tests of this crate.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use shared_types::DescriptorPatch;
use tokio::time::Instant;

use crate::service::{Args, LifecycleFuture, Service};
use crate::wiring::{Wire, Wiring};

/// One journal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Entry {
    pub order: i32,
    pub phase: &'static str,
    pub at: Instant,
}

/// Records what every [`Step`] did, in the order it happened.
#[derive(Debug, Default)]
pub(crate) struct Journal {
    entries: Mutex<Vec<Entry>>,
}

impl Journal {
    pub(crate) fn record(&self, order: i32, phase: &'static str) {
        self.entries.lock().push(Entry {
            order,
            phase,
            at: Instant::now(),
        });
    }

    pub(crate) fn entries(&self) -> Vec<Entry> {
        self.entries.lock().clone()
    }

    /// `(order, phase)` pairs without timestamps.
    pub(crate) fn trace(&self) -> Vec<(i32, &'static str)> {
        self.entries.lock().iter().map(|e| (e.order, e.phase)).collect()
    }

    pub(crate) fn count(&self, phase: &'static str) -> usize {
        self.entries.lock().iter().filter(|e| e.phase == phase).count()
    }
}

impl Service for Journal {
    fn construct(_: &mut Wiring<'_>) -> anyhow::Result<Self> {
        Ok(Self::default())
    }
}

/// Service with lifecycle order `ORDER` that defines one method, `run`.
///
/// `run` takes up to three arguments:
/// - `[0]` milliseconds to sleep between `start` and `end`
/// - `[1]` order of the step that fails right after `start`
/// - `[2]` order of the step that panics right after `start`
#[derive(Debug)]
pub(crate) struct Step<const ORDER: i32> {
    journal: Wire<Journal>,
}

fn targets(args: &Args, index: usize, order: i32) -> bool {
    args.get(index).and_then(Value::as_i64) == Some(i64::from(order))
}

impl<const ORDER: i32> Service for Step<ORDER> {
    fn metadata() -> DescriptorPatch {
        DescriptorPatch::new().order(ORDER)
    }

    fn construct(wiring: &mut Wiring<'_>) -> anyhow::Result<Self> {
        Ok(Self {
            journal: wiring.wire::<Journal>()?,
        })
    }

    fn invoke(self: Arc<Self>, method: &str, args: Args) -> Option<LifecycleFuture> {
        if method != "run" {
            return None;
        }
        Some(Box::pin(async move {
            let journal = self.journal.get()?;
            journal.record(ORDER, "start");

            if targets(&args, 1, ORDER) {
                anyhow::bail!("step {} failed", ORDER);
            }
            if targets(&args, 2, ORDER) {
                panic!("step {} panicked", ORDER);
            }

            let delay = args.first().and_then(Value::as_u64).unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(delay)).await;

            journal.record(ORDER, "end");
            Ok::<_, anyhow::Error>(())
        }))
    }
}
