//! # Error Types
//!
//! Errors raised while building a container, resolving services, invoking
//! lifecycle methods and moving values in and out of fields.

use thiserror::Error;

use crate::entities::ServiceId;

/// Configuration and resolution errors.
///
/// These point at a static wiring mistake and are never retried.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// The type was never registered, or was resolved before registration.
    #[error("Service not found: {type_name}")]
    ServiceNotFound { type_name: &'static str },

    /// No instance exists for this id.
    #[error("Unknown service id: {0}")]
    UnknownService(ServiceId),

    /// A declared observable or persisted key has no matching field.
    #[error("Service {service} declares field `{field}` but does not expose it")]
    UnknownField { service: &'static str, field: String },

    /// A wire or container handle was read before the build finished.
    #[error("Reference to service {target} read before the container was built")]
    Unresolved { target: ServiceId },

    /// The container behind a wire or handle has been dropped.
    #[error("Container dropped")]
    ContainerDropped,

    /// The instance stored under `id` is not of the requested type.
    #[error("Service {id} is not a {expected}")]
    TypeMismatch { id: ServiceId, expected: &'static str },

    /// A cell was subscribed to before the container instrumented it.
    #[error("Field is not instrumented")]
    NotInstrumented,

    /// A service constructor failed.
    #[error("Failed to construct {type_name}: {source}")]
    Construction {
        type_name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

/// Failure of a single lifecycle call.
#[derive(Debug, Error)]
#[error("{type_name}::{method} on service {service} failed: {kind}")]
pub struct InvocationError {
    pub service: ServiceId,
    pub type_name: &'static str,
    pub method: String,
    pub kind: InvocationErrorKind,
}

/// Why a lifecycle call failed.
#[derive(Debug, Error)]
pub enum InvocationErrorKind {
    /// The method returned an error.
    #[error("{0}")]
    Failed(anyhow::Error),

    /// The call panicked.
    #[error("call panicked")]
    Panicked,
}

impl InvocationError {
    /// The error returned by the service, if the call did not panic.
    #[must_use]
    pub fn cause(&self) -> Option<&anyhow::Error> {
        match &self.kind {
            InvocationErrorKind::Failed(err) => Some(err),
            InvocationErrorKind::Panicked => None,
        }
    }
}
