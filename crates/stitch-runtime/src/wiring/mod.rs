//! # Wiring
//!
//! Dependency placeholders handed to service constructors and the deferred
//! lookups they turn into once the container exists.
//!
//! ## Two-Phase Resolution
//!
//! ```text
//! construct A ──wire::<B>()──→ Wire<B> { target: 1, slot }   (unbound)
//! construct B ──wire::<A>()──→ Wire<A> { target: 0, slot }   (unbound)
//!                    │
//!                    ▼  container created
//!              slot.bind(&container)
//!                    │
//!                    ▼
//! a.b.get() ──→ container.instances[1]   (looked up on every read)
//! ```
//!
//! A wire never stores the target instance. It holds a weak handle to the
//! container and indexes into it on access, which is what lets A and B refer
//! to each other regardless of which one was built first, without creating
//! a reference cycle.

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock, Weak};

use shared_types::{ContainerError, ServiceId, WireReference};
use tracing::debug;

use crate::container::{Container, ContainerInner};
use crate::registry::ServiceRegistry;
use crate::service::Service;

/// Late-bound handle to the container under construction.
///
/// Shared by every wire and back-reference created during one build.
#[derive(Clone, Default)]
pub(crate) struct ContainerSlot(Arc<OnceLock<Weak<ContainerInner>>>);

impl ContainerSlot {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Point the slot at the built container. Only the first bind counts.
    pub(crate) fn bind(&self, container: &Arc<ContainerInner>) -> bool {
        self.0.set(Arc::downgrade(container)).is_ok()
    }

    fn is_bound(&self) -> bool {
        self.0.get().is_some()
    }

    fn upgrade(&self, target: ServiceId) -> Result<Arc<ContainerInner>, ContainerError> {
        self.0
            .get()
            .ok_or(ContainerError::Unresolved { target })?
            .upgrade()
            .ok_or(ContainerError::ContainerDropped)
    }
}

/// Read-only reference to the singleton of `T`.
///
/// Resolved on every [`get`](Self::get); there is no way to reassign it.
pub struct Wire<T> {
    reference: WireReference,
    slot: ContainerSlot,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Service> Wire<T> {
    /// The instance this wire points at.
    pub fn get(&self) -> Result<Arc<T>, ContainerError> {
        let container = self.slot.upgrade(self.reference.target)?;
        container.downcast::<T>(self.reference.target)
    }
}

impl<T> Wire<T> {
    #[must_use]
    pub fn reference(&self) -> WireReference {
        self.reference
    }

    #[must_use]
    pub fn target(&self) -> ServiceId {
        self.reference.target
    }

    /// Whether the container has been bound.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.slot.is_bound()
    }
}

impl<T> Clone for Wire<T> {
    fn clone(&self) -> Self {
        Self {
            reference: self.reference,
            slot: self.slot.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Wire<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wire")
            .field("type", &type_name::<T>())
            .field("target", &self.reference.target)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// Back-reference from a service to the container that owns it.
#[derive(Clone)]
pub struct ContainerRef {
    owner: ServiceId,
    slot: ContainerSlot,
}

impl ContainerRef {
    /// The owning container.
    ///
    /// Returns a strong handle; keep it for the duration of a call rather than
    /// storing it inside a service, or the container will never be freed.
    pub fn get(&self) -> Result<Container, ContainerError> {
        self.slot.upgrade(self.owner).map(Container::from_inner)
    }

    /// Resolve a service through the owning container.
    pub fn pick<T: Service>(&self) -> Result<Arc<T>, ContainerError> {
        self.get()?.pick::<T>()
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.slot.is_bound()
    }
}

impl fmt::Debug for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerRef")
            .field("owner", &self.owner)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// Construction context passed to [`Service::construct`].
pub struct Wiring<'a> {
    registry: &'a ServiceRegistry,
    id: ServiceId,
    slot: ContainerSlot,
    /// Wires handed out so far, set aside for the resolve phase.
    pending: Vec<WireReference>,
}

impl<'a> Wiring<'a> {
    pub(crate) fn new(registry: &'a ServiceRegistry, id: ServiceId, slot: ContainerSlot) -> Self {
        Self {
            registry,
            id,
            slot,
            pending: Vec::new(),
        }
    }

    /// Id of the service being constructed.
    #[must_use]
    pub fn id(&self) -> ServiceId {
        self.id
    }

    /// Declare a dependency on the singleton of `T`.
    ///
    /// Fails with [`ContainerError::ServiceNotFound`] if `T` is not registered.
    pub fn wire<T: Service>(&mut self) -> Result<Wire<T>, ContainerError> {
        let target = self.registry.id_of::<T>()?;
        let reference = WireReference::new(target);
        self.pending.push(reference);

        debug!(
            from = %self.id,
            to = %target,
            target_type = type_name::<T>(),
            "Wire declared"
        );

        Ok(Wire {
            reference,
            slot: self.slot.clone(),
            _marker: PhantomData,
        })
    }

    /// Back-reference to the container being built.
    #[must_use]
    pub fn container(&self) -> ContainerRef {
        ContainerRef {
            owner: self.id,
            slot: self.slot.clone(),
        }
    }

    pub(crate) fn into_pending(self) -> Vec<WireReference> {
        self.pending
    }
}
