//! # Reactive Fields
//!
//! [`ObservableCell`] is the field type for service state that can be
//! observed or persisted.
//!
//! - `get()` returns the current value.
//! - `set(v)` stores `v` and, once the container has instrumented the cell,
//!   publishes `(service, key, v)` on the change bus. Writing a value equal to
//!   the stored one does nothing and publishes nothing.
//!
//! Writers are serialised per cell: a store and the publish that follows it
//! happen as one step, so events for a cell arrive in the order the values
//! were stored and the last event always carries the visible value. A
//! listener may write back to the cell it is observing.
//!
//! Cells start out uninstrumented: they store values but never publish. The
//! container binds every cell listed in a descriptor's `observable_keys`
//! during the instrument phase.

use std::fmt;
use std::sync::OnceLock;

use parking_lot::{ReentrantMutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use shared_bus::{ChangeBus, EventFilter, Subscription};
use shared_types::{ContainerError, ServiceId};
use tracing::{debug, warn};

/// Values a cell can hold.
pub trait FieldValue: Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> FieldValue for T where T: Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static {}

/// Type-erased access to a field, used by the container and the snapshot codec.
pub trait Field: Send + Sync {
    /// Current value as JSON.
    fn value(&self) -> Result<Value, serde_json::Error>;

    /// Decode `value` and store it through the normal setter.
    ///
    /// Returns whether the stored value changed.
    fn assign(&self, value: Value) -> Result<bool, serde_json::Error>;

    /// Route future changes to `bus` as `(service, key, value)`.
    ///
    /// Returns `false` if the field was already instrumented.
    fn instrument(&self, service: ServiceId, key: &str, bus: &ChangeBus) -> bool;
}

struct Binding {
    service: ServiceId,
    key: String,
    bus: ChangeBus,
}

/// A field with change notification.
pub struct ObservableCell<T> {
    value: RwLock<T>,
    /// Held from store through publish by every writer.
    writer: ReentrantMutex<()>,
    binding: OnceLock<Binding>,
}

impl<T: FieldValue> ObservableCell<T> {
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            value: RwLock::new(initial),
            writer: ReentrantMutex::new(()),
            binding: OnceLock::new(),
        }
    }

    /// Current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Borrow the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read())
    }

    /// Store `value`, publishing a change if it differs from the current one.
    ///
    /// Returns whether the value changed.
    pub fn set(&self, value: T) -> bool {
        let _writer = self.writer.lock();
        self.store_and_publish(value)
    }

    /// Compute the next value from the current one and store it.
    ///
    /// Concurrent updates of the same cell never lose a write. `f` runs
    /// without the value lock, so it may read the cell.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> bool {
        let _writer = self.writer.lock();
        let next = f(&self.get());
        self.store_and_publish(next)
    }

    /// Caller holds `writer`.
    fn store_and_publish(&self, value: T) -> bool {
        {
            let mut current = self.value.write();
            if *current == value {
                return false;
            }
            *current = value.clone();
        }

        if let Some(binding) = self.binding.get() {
            match serde_json::to_value(&value) {
                Ok(encoded) => {
                    binding.bus.dispatch(binding.service, &binding.key, &encoded);
                }
                Err(e) => {
                    warn!(
                        service = %binding.service,
                        property = %binding.key,
                        error = %e,
                        "Change not published: value cannot be encoded"
                    );
                }
            }
        }

        true
    }

    /// Listen for changes of this field only.
    ///
    /// Fails with [`ContainerError::NotInstrumented`] before the container has
    /// bound the cell.
    pub fn subscribe<F>(&self, callback: F) -> Result<Subscription, ContainerError>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let binding = self.binding.get().ok_or(ContainerError::NotInstrumented)?;
        let filter = EventFilter::field(binding.service, binding.key.clone());

        Ok(binding
            .bus
            .listen_filtered(filter, move |_, _, value| callback(value)))
    }

    #[must_use]
    pub fn is_instrumented(&self) -> bool {
        self.binding.get().is_some()
    }
}

impl<T: FieldValue> Field for ObservableCell<T> {
    fn value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(&*self.value.read())
    }

    fn assign(&self, value: Value) -> Result<bool, serde_json::Error> {
        let decoded: T = serde_json::from_value(value)?;
        Ok(self.set(decoded))
    }

    fn instrument(&self, service: ServiceId, key: &str, bus: &ChangeBus) -> bool {
        let bound = self
            .binding
            .set(Binding {
                service,
                key: key.to_string(),
                bus: bus.clone(),
            })
            .is_ok();

        if bound {
            debug!(service = %service, property = key, "Field instrumented");
        }
        bound
    }
}

impl<T: FieldValue + Default> Default for ObservableCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: FieldValue + fmt::Debug> fmt::Debug for ObservableCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("ObservableCell");
        out.field("value", &*self.value.read());
        if let Some(binding) = self.binding.get() {
            out.field("service", &binding.service)
                .field("key", &binding.key);
        }
        out.finish()
    }
}
