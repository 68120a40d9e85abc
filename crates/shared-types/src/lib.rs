//! # Shared Types Crate
//!
//! Types shared between the change bus and the service runtime.
//!
//! ## Contents
//!
//! - **Identity**: [`ServiceId`] and the precedence constants used for ordering
//! - **Metadata**: [`Descriptor`] and [`DescriptorPatch`], the merge-only record
//!   attached to every registered service type
//! - **Wiring**: [`WireReference`], the tagged placeholder for a dependency
//!   that is resolved once the container exists
//! - **Errors**: [`ContainerError`], [`InvocationError`]

pub mod descriptor;
pub mod entities;
pub mod errors;

pub use descriptor::{Descriptor, DescriptorPatch, TimerOptions, TimerSpec};
pub use entities::*;
pub use errors::*;
