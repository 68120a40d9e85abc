//! # Integration Tests
//!
//! Behaviour that spans the registry, the container, the change bus and the
//! snapshot stores.

pub mod lifecycle;
pub mod runtime;
pub mod snapshot;
