//! # Stitch Runtime Library
//!
//! Dependency-injection runtime for long-lived services.
//!
//! A [`ServiceRegistry`] records every service type with its descriptor;
//! [`Container::build`] turns it into one shared instance per type with
//! cross-references resolved, observable fields instrumented, lifecycle
//! methods callable in order or in parallel, and persisted fields
//! snapshot-able.
//!
//! ## Modules
//!
//! - `registry/` - per-type descriptors and registration order
//! - `wiring/` - wires handed to constructors and resolved after build
//! - `reactive/` - observable fields publishing on the change bus
//! - `container/` - the build and the resolved service graph
//! - `lifecycle/` - ordered and parallel method invocation
//! - `snapshot/` - capture/restore of persisted fields and their stores
//! - `handlers/` - timers and async observers of a built container
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut registry = ServiceRegistry::new();
//! registry.register::<Hello>();
//! registry.register::<Pager>();
//!
//! let container = Container::build(&registry)?;
//! container.ordered_invoke("created", vec![]).await?;
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![allow(clippy::module_name_repetitions)]

pub mod container;
pub mod handlers;
pub mod lifecycle;
pub mod reactive;
pub mod registry;
pub mod runtime;
pub mod service;
pub mod snapshot;
pub mod wiring;

#[cfg(test)]
pub(crate) mod testing;

pub use container::{ConfigError, Container, RuntimeConfig, ServiceEntry};
pub use handlers::{Observer, TimerScheduler};
pub use reactive::{Field, FieldValue, ObservableCell};
pub use registry::{RegisteredService, ServiceRegistry};
pub use runtime::ServiceRuntime;
pub use service::{Args, LifecycleFuture, Service};
pub use snapshot::{
    snapshot_key, JsonFileStore, MemorySnapshotStore, Persistence, Snapshot, SnapshotStore,
    StoreError,
};
pub use wiring::{ContainerRef, Wire, Wiring};

// Re-export the vocabulary types so services only need this crate
pub use shared_bus::{ChangeBus, ChangeEvent, ChangeStream, EventFilter, ListenerId, Subscription};
pub use shared_types::{
    ContainerError, Descriptor, DescriptorPatch, InvocationError, InvocationErrorKind, ServiceId,
    TimerOptions, TimerSpec, WireReference, DEFAULT_ORDER, HIGHEST_PRECEDENCE, LOWEST_PRECEDENCE,
};
