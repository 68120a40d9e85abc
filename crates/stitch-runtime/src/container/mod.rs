//! # Service Container
//!
//! Holds the singleton of every registered service, the change bus they
//! publish on, and the entry points for resolution and lifecycle calls.
//!
//! - `builder` - the three-phase build (instantiate, resolve wiring, instrument)
//! - `config` - runtime configuration for hosts

pub mod builder;
pub mod config;

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use shared_bus::{ChangeBus, ListenerId, Subscription};
use shared_types::{ContainerError, Descriptor, InvocationError, ServiceId};

use crate::lifecycle;
use crate::registry::ServiceRegistry;
use crate::service::Service;
use crate::snapshot::{self, Snapshot};

pub use config::{ConfigError, RuntimeConfig};

/// One built service.
pub struct ServiceEntry {
    pub(crate) descriptor: Descriptor,
    pub(crate) id: ServiceId,
    pub(crate) type_name: &'static str,
    pub(crate) service: Arc<dyn Service>,
    pub(crate) any: Arc<dyn Any + Send + Sync>,
}

impl ServiceEntry {
    #[must_use]
    pub fn id(&self) -> ServiceId {
        self.id
    }

    #[must_use]
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[must_use]
    pub fn service(&self) -> &Arc<dyn Service> {
        &self.service
    }
}

impl fmt::Debug for ServiceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceEntry")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .field("order", &self.descriptor.order)
            .finish()
    }
}

pub(crate) struct ContainerInner {
    /// Built services, indexed by id.
    pub(crate) entries: Vec<ServiceEntry>,
    pub(crate) by_type: HashMap<TypeId, ServiceId>,
    pub(crate) bus: ChangeBus,
}

impl ContainerInner {
    pub(crate) fn entry(&self, id: ServiceId) -> Result<&ServiceEntry, ContainerError> {
        self.entries
            .get(id.index())
            .ok_or(ContainerError::UnknownService(id))
    }

    pub(crate) fn downcast<T: Service>(&self, id: ServiceId) -> Result<Arc<T>, ContainerError> {
        let entry = self.entry(id)?;
        Arc::clone(&entry.any)
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch {
                id,
                expected: type_name::<T>(),
            })
    }
}

/// Handle to a built service graph.
///
/// Cloning is cheap; every clone refers to the same instances.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    /// Build one instance of every service in `registry`.
    ///
    /// See [`builder`] for the phases.
    pub fn build(registry: &ServiceRegistry) -> Result<Self, ContainerError> {
        builder::build(registry)
    }

    pub(crate) fn from_inner(inner: Arc<ContainerInner>) -> Self {
        Self { inner }
    }

    /// The singleton of `T`.
    pub fn pick<T: Service>(&self) -> Result<Arc<T>, ContainerError> {
        let id = self.id_of::<T>()?;
        self.inner.downcast::<T>(id)
    }

    /// Id of the singleton of `T`.
    pub fn id_of<T: Service>(&self) -> Result<ServiceId, ContainerError> {
        self.inner
            .by_type
            .get(&TypeId::of::<T>())
            .copied()
            .ok_or(ContainerError::ServiceNotFound {
                type_name: type_name::<T>(),
            })
    }

    /// Type-erased instance by id.
    pub fn instance(&self, id: ServiceId) -> Result<Arc<dyn Service>, ContainerError> {
        self.inner.entry(id).map(|entry| Arc::clone(&entry.service))
    }

    #[must_use]
    pub fn descriptor(&self, id: ServiceId) -> Option<&Descriptor> {
        self.inner.entries.get(id.index()).map(|entry| &entry.descriptor)
    }

    /// All services in id order.
    pub fn services(&self) -> impl Iterator<Item = &ServiceEntry> {
        self.inner.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// The bus every observable field publishes on.
    #[must_use]
    pub fn bus(&self) -> &ChangeBus {
        &self.inner.bus
    }

    /// Listen for changes of every observable field.
    pub fn listen<F>(&self, callback: F) -> Subscription
    where
        F: Fn(ServiceId, &str, &Value) + Send + Sync + 'static,
    {
        self.inner.bus.listen(callback)
    }

    /// Remove a listener. Idempotent.
    pub fn detach(&self, listener: ListenerId) {
        self.inner.bus.detach(listener);
    }

    /// Call `method` on every service that defines it, one after another.
    ///
    /// See [`lifecycle::ordered_invoke`].
    pub async fn ordered_invoke(&self, method: &str, args: Vec<Value>) -> Result<(), InvocationError> {
        lifecycle::ordered_invoke(self, method, args).await
    }

    /// Call `method` on every service that defines it, all at once.
    ///
    /// See [`lifecycle::invoke`].
    pub async fn invoke(&self, method: &str, args: Vec<Value>) -> Result<(), InvocationError> {
        lifecycle::invoke(self, method, args).await
    }

    /// Capture the persisted fields of every service.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        snapshot::capture(self)
    }

    /// Restore persisted fields from `snapshot`. Returns the number of fields assigned.
    pub fn restore(&self, snapshot: &Snapshot) -> usize {
        snapshot::restore(self, snapshot)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("services", &self.inner.entries)
            .field("bus", &self.inner.bus)
            .finish()
    }
}
