//! # Service Trait
//!
//! The contract every type managed by the container implements.
//!
//! ## Example Implementation
//!
//! ```rust,ignore
//! use stitch_runtime::{Args, DescriptorPatch, Field, LifecycleFuture, ObservableCell, Service, Wire, Wiring};
//!
//! pub struct Hello {
//!     counter: ObservableCell<i64>,
//!     pager: Wire<Pager>,
//! }
//!
//! impl Service for Hello {
//!     fn metadata() -> DescriptorPatch {
//!         DescriptorPatch::new().observable("counter").persisted("counter")
//!     }
//!
//!     fn construct(wiring: &mut Wiring<'_>) -> anyhow::Result<Self> {
//!         Ok(Self { counter: ObservableCell::new(0), pager: wiring.wire::<Pager>()? })
//!     }
//!
//!     fn field(&self, key: &str) -> Option<&dyn Field> {
//!         match key {
//!             "counter" => Some(&self.counter),
//!             _ => None,
//!         }
//!     }
//!
//!     fn invoke(self: Arc<Self>, method: &str, _args: Args) -> Option<LifecycleFuture> {
//!         match method {
//!             "created" => Some(Box::pin(async move { self.created().await })),
//!             _ => None,
//!         }
//!     }
//! }
//! ```

use std::any::Any;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;
use shared_types::DescriptorPatch;

use crate::reactive::Field;
use crate::wiring::Wiring;

/// Arguments passed to every service selected by a lifecycle call.
pub type Args = Arc<[Value]>;

/// A started lifecycle call.
pub type LifecycleFuture = BoxFuture<'static, anyhow::Result<()>>;

/// A type the container can build, wire, observe and drive.
pub trait Service: Any + Send + Sync {
    /// Metadata merged into the descriptor when the type is first registered.
    fn metadata() -> DescriptorPatch
    where
        Self: Sized,
    {
        DescriptorPatch::default()
    }

    /// Build the instance.
    ///
    /// Dependencies are declared through [`Wiring::wire`]; they cannot be
    /// read until the whole container is built.
    fn construct(wiring: &mut Wiring<'_>) -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Look up a field by its declared name.
    ///
    /// Every observable and persisted key in the descriptor must resolve here.
    fn field(&self, key: &str) -> Option<&dyn Field> {
        let _ = key;
        None
    }

    /// Return the call for `method` if this service defines it.
    fn invoke(self: Arc<Self>, method: &str, args: Args) -> Option<LifecycleFuture> {
        let _ = (method, args);
        None
    }
}
