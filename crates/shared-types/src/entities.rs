//! # Core Entities
//!
//! Service identity, ordering precedence and the wire placeholder.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned to a service type when it is registered.
///
/// Ids are handed out densely from zero in registration order and double as
/// the index of the instance inside a built container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(pub u32);

impl ServiceId {
    /// Position of the instance in the container.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ServiceId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Order value that runs before everything else.
pub const HIGHEST_PRECEDENCE: i32 = -999_999_999;

/// Order assigned to services that do not declare one.
pub const DEFAULT_ORDER: i32 = 0;

/// Order value that runs after everything else.
pub const LOWEST_PRECEDENCE: i32 = 999_999_999;

/// Placeholder for "this field resolves to the singleton of `target`".
///
/// Created while a service is being constructed, before any instance exists.
/// The container builder replaces every reference with a live binding; a
/// reference is never kept as final state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WireReference {
    /// Service the field points at.
    pub target: ServiceId,
}

impl WireReference {
    #[must_use]
    pub fn new(target: ServiceId) -> Self {
        Self { target }
    }
}
