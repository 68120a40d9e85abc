//! # Service Descriptors
//!
//! Metadata attached to a registered service type.
//!
//! A [`Descriptor`] is never edited in place. Registration folds a
//! [`DescriptorPatch`] over the previous descriptor and stores the result:
//!
//! - scalar fields (`order`, `name`, `version`) are replaced when the patch
//!   sets them and kept otherwise
//! - list fields (`observable_keys`, `persisted_keys`, `timers`) are
//!   concatenated, skipping entries that are already present
//! - the id is owned by the registry and is never touched by a patch

use serde::{Deserialize, Serialize};

use crate::entities::{ServiceId, DEFAULT_ORDER};

/// Merged metadata for one service type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    /// Registration id. `None` until the type is registered as a service.
    pub id: Option<ServiceId>,
    /// Lifecycle order, lower runs earlier.
    pub order: i32,
    /// Stable name used for snapshot keys instead of the id.
    pub name: Option<String>,
    /// State version. Bumping it invalidates previously captured snapshots.
    pub version: u32,
    /// Fields that publish change events. Set semantics.
    pub observable_keys: Vec<String>,
    /// Fields included in snapshots, in capture order.
    pub persisted_keys: Vec<String>,
    /// Periodic calls declared on this type.
    pub timers: Vec<TimerSpec>,
}

impl Default for Descriptor {
    fn default() -> Self {
        Self {
            id: None,
            order: DEFAULT_ORDER,
            name: None,
            version: 1,
            observable_keys: Vec::new(),
            persisted_keys: Vec::new(),
            timers: Vec::new(),
        }
    }
}

impl Descriptor {
    /// Fold `patch` over this descriptor, returning the merged copy.
    #[must_use]
    pub fn merged(&self, patch: &DescriptorPatch) -> Self {
        let mut next = self.clone();

        if let Some(order) = patch.order {
            next.order = order;
        }
        if let Some(name) = &patch.name {
            next.name = Some(name.clone());
        }
        if let Some(version) = patch.version {
            next.version = version;
        }

        extend_unique(&mut next.observable_keys, &patch.observable_keys);
        extend_unique(&mut next.persisted_keys, &patch.persisted_keys);
        for timer in &patch.timers {
            if !next.timers.contains(timer) {
                next.timers.push(timer.clone());
            }
        }

        next
    }

    /// Copy of this descriptor carrying `id`.
    #[must_use]
    pub fn with_id(mut self, id: ServiceId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn is_observable(&self, key: &str) -> bool {
        self.observable_keys.iter().any(|k| k == key)
    }

    #[must_use]
    pub fn is_persisted(&self, key: &str) -> bool {
        self.persisted_keys.iter().any(|k| k == key)
    }
}

fn extend_unique(target: &mut Vec<String>, keys: &[String]) {
    for key in keys {
        if !target.contains(key) {
            target.push(key.clone());
        }
    }
}

/// Partial descriptor applied by registration.
///
/// Built with the chained setters:
///
/// ```rust
/// use shared_types::{DescriptorPatch, TimerOptions};
///
/// let patch = DescriptorPatch::new()
///     .order(10)
///     .name("Hello")
///     .observable("counter")
///     .persisted("counter")
///     .timer("tick", 1_000, TimerOptions::default());
/// assert_eq!(patch.order, Some(10));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorPatch {
    pub order: Option<i32>,
    pub name: Option<String>,
    pub version: Option<u32>,
    pub observable_keys: Vec<String>,
    pub persisted_keys: Vec<String>,
    pub timers: Vec<TimerSpec>,
}

impl DescriptorPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    /// Mark `key` as publishing change events.
    #[must_use]
    pub fn observable(mut self, key: impl Into<String>) -> Self {
        self.observable_keys.push(key.into());
        self
    }

    /// Include `key` in snapshots.
    #[must_use]
    pub fn persisted(mut self, key: impl Into<String>) -> Self {
        self.persisted_keys.push(key.into());
        self
    }

    /// Declare a periodic call of the lifecycle method `key`.
    #[must_use]
    pub fn timer(mut self, key: impl Into<String>, interval_ms: u64, options: TimerOptions) -> Self {
        self.timers.push(TimerSpec {
            key: key.into(),
            interval_ms,
            options,
        });
        self
    }
}

/// A periodic call declared on a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSpec {
    /// Lifecycle method to call.
    pub key: String,
    /// Interval between calls in milliseconds.
    pub interval_ms: u64,
    pub options: TimerOptions,
}

/// Options controlling how a timer fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerOptions {
    /// Await each call before the next tick; ticks that elapse meanwhile are skipped.
    pub wait_for_call: bool,
    /// Stop after this many calls. Zero means unlimited.
    pub count: u32,
    /// Fire once after the first interval, then stop.
    pub call_once: bool,
}

impl TimerOptions {
    /// Maximum number of calls, if bounded.
    #[must_use]
    pub fn limit(&self) -> Option<u32> {
        if self.call_once {
            Some(1)
        } else if self.count > 0 {
            Some(self.count)
        } else {
            None
        }
    }
}
