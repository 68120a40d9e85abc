//! # Service Registry
//!
//! Per-type descriptor store plus the ordered list of registered services.
//!
//! ## How It Works
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ServiceRegistry                        │
//! │                                                             │
//! │  descriptors (by TypeId)          services (by id)          │
//! │  ┌──────────────┐                 ┌────┬────┬────┐          │
//! │  │ Hello → {..} │                 │ 0  │ 1  │ 2  │ ...      │
//! │  │ Pager → {..} │                 │Hel │Pag │Clk │          │
//! │  │ Clock → {..} │                 └────┴────┴────┘          │
//! │  └──────────────┘                        │                  │
//! │                                          ▼                  │
//! │                               Container::build(&registry)   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Descriptors are attached to the type itself (keyed by [`TypeId`]), so
//! metadata can be read or annotated without walking the service list. The
//! service list keeps registration order because the container builds every
//! registered type exactly once, in that order.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use shared_types::{ContainerError, Descriptor, DescriptorPatch, ServiceId};
use tracing::{debug, info};

use crate::service::Service;
use crate::wiring::Wiring;

/// Type-erased constructor: both views of the same new instance.
pub(crate) type Constructor = fn(
    &mut Wiring<'_>,
) -> anyhow::Result<(Arc<dyn Service>, Arc<dyn std::any::Any + Send + Sync>)>;

fn construct_erased<T: Service>(
    wiring: &mut Wiring<'_>,
) -> anyhow::Result<(Arc<dyn Service>, Arc<dyn std::any::Any + Send + Sync>)> {
    let instance = Arc::new(T::construct(wiring)?);
    Ok((instance.clone(), instance))
}

/// A type registered as a service.
#[derive(Clone)]
pub struct RegisteredService {
    id: ServiceId,
    type_id: TypeId,
    type_name: &'static str,
    constructor: Constructor,
}

impl RegisteredService {
    #[must_use]
    pub fn id(&self) -> ServiceId {
        self.id
    }

    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn constructor(&self) -> Constructor {
        self.constructor
    }
}

impl fmt::Debug for RegisteredService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredService")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Registry of service types and their descriptors.
///
/// An explicit object rather than process state: build one per container,
/// or [`reset`](Self::reset) it between tests.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    /// Merged descriptors, attached to their type.
    descriptors: HashMap<TypeId, Descriptor>,
    /// Registered services in registration order. Index equals id.
    services: Vec<RegisteredService>,
    /// Next id to hand out.
    next_id: u32,
}

impl ServiceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` with the metadata from [`Service::metadata`].
    ///
    /// The first call assigns the next id; later calls return it unchanged.
    pub fn register<T: Service>(&mut self) -> ServiceId {
        self.register_with::<T>(DescriptorPatch::default())
    }

    /// Register `T` and merge `patch` over its descriptor.
    pub fn register_with<T: Service>(&mut self, patch: DescriptorPatch) -> ServiceId {
        let type_id = TypeId::of::<T>();
        let current = self.descriptors.get(&type_id).cloned().unwrap_or_default();

        let (id, base) = match current.id {
            Some(id) => (id, current),
            None => {
                let id = ServiceId(self.next_id);
                self.next_id += 1;
                self.services.push(RegisteredService {
                    id,
                    type_id,
                    type_name: type_name::<T>(),
                    constructor: construct_erased::<T>,
                });
                info!(service = type_name::<T>(), id = %id, "[Registry] Registering service");
                (id, current.merged(&T::metadata()).with_id(id))
            }
        };

        self.descriptors.insert(type_id, base.merged(&patch));
        id
    }

    /// Merge `patch` into `T`'s descriptor without registering it as a service.
    pub fn annotate<T: 'static>(&mut self, patch: DescriptorPatch) {
        let type_id = TypeId::of::<T>();
        let merged = self
            .descriptors
            .get(&type_id)
            .cloned()
            .unwrap_or_default()
            .merged(&patch);

        debug!(service = type_name::<T>(), "[Registry] Descriptor annotated");
        self.descriptors.insert(type_id, merged);
    }

    /// Merged descriptor for `T`, or an all-default one if nothing is known.
    #[must_use]
    pub fn read<T: 'static>(&self) -> Descriptor {
        self.descriptors
            .get(&TypeId::of::<T>())
            .cloned()
            .unwrap_or_default()
    }

    /// Id assigned to `T`.
    pub fn id_of<T: 'static>(&self) -> Result<ServiceId, ContainerError> {
        self.descriptors
            .get(&TypeId::of::<T>())
            .and_then(|descriptor| descriptor.id)
            .ok_or(ContainerError::ServiceNotFound {
                type_name: type_name::<T>(),
            })
    }

    /// Descriptor of a registered service.
    #[must_use]
    pub fn descriptor_of(&self, service: &RegisteredService) -> Descriptor {
        self.descriptors
            .get(&service.type_id)
            .cloned()
            .unwrap_or_default()
            .with_id(service.id)
    }

    /// Registered services in registration order.
    pub fn services(&self) -> impl Iterator<Item = &RegisteredService> {
        self.services.iter()
    }

    #[must_use]
    pub fn is_registered<T: 'static>(&self) -> bool {
        self.id_of::<T>().is_ok()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Forget every descriptor and service and restart ids from zero.
    pub fn reset(&mut self) {
        self.descriptors.clear();
        self.services.clear();
        self.next_id = 0;
        debug!("[Registry] Reset");
    }
}
