//! # Lifecycle Invocation
//!
//! Calls a named method on every service that defines it.
//!
//! Services are visited in ascending `(order, id)`. A service "defines" a
//! method when its [`Service::invoke`] returns a call for that name.
//!
//! ## Ordered
//!
//! ```text
//! order: -5        0         10
//!        ├──call──┤
//!                 ├──call──┤
//!                           ├──call──┤
//! ```
//!
//! Each call completes before the next one starts. The first failure stops
//! the chain; later services are never asked.
//!
//! ## Parallel
//!
//! ```text
//! order: -5   ├──call────────┤
//!         0   ├──call──┤
//!        10   ├──call──────────────┤
//! ```
//!
//! Every call is spawned on the tokio runtime at once. The first failure is
//! returned immediately; calls still running are left to finish on their own.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use serde_json::Value;
use shared_types::{InvocationError, InvocationErrorKind, ServiceId};
use tracing::{debug, info, warn};

use crate::container::Container;
use crate::service::{Args, LifecycleFuture, Service};

struct Target {
    id: ServiceId,
    type_name: &'static str,
    service: Arc<dyn Service>,
}

/// Every service in ascending `(order, id)`.
fn by_order(container: &Container) -> Vec<Target> {
    let mut entries: Vec<_> = container.services().collect();
    entries.sort_by_key(|entry| (entry.descriptor().order, entry.id()));
    entries
        .into_iter()
        .map(|entry| Target {
            id: entry.id(),
            type_name: entry.type_name(),
            service: Arc::clone(entry.service()),
        })
        .collect()
}

fn failure(
    service: ServiceId,
    type_name: &'static str,
    method: &str,
    kind: InvocationErrorKind,
) -> InvocationError {
    InvocationError {
        service,
        type_name,
        method: method.to_string(),
        kind,
    }
}

/// Ask `target` for its call.
///
/// A panic while the call is being built counts as a panicked call.
fn prepare(
    target: &Target,
    method: &str,
    args: &Args,
) -> Option<Result<LifecycleFuture, InvocationError>> {
    let service = Arc::clone(&target.service);
    match catch_unwind(AssertUnwindSafe(|| service.invoke(method, Arc::clone(args)))) {
        Ok(call) => call.map(Ok),
        Err(_) => Some(Err(failure(
            target.id,
            target.type_name,
            method,
            InvocationErrorKind::Panicked,
        ))),
    }
}

/// Call `method` on each service in turn, awaiting each call.
///
/// Resolves once the last call completes, or with the first failure.
pub async fn ordered_invoke(
    container: &Container,
    method: &str,
    args: Vec<Value>,
) -> Result<(), InvocationError> {
    let args: Args = args.into();
    let mut called = 0usize;

    for target in by_order(container) {
        let call = match prepare(&target, method, &args) {
            None => continue,
            Some(Ok(call)) => call,
            Some(Err(error)) => {
                warn!(error = %error, "Ordered invocation stopped");
                return Err(error);
            }
        };

        debug!(service = target.type_name, id = %target.id, method, "Invoking");
        called += 1;

        let kind = match AssertUnwindSafe(call).catch_unwind().await {
            Ok(Ok(())) => continue,
            Ok(Err(err)) => InvocationErrorKind::Failed(err),
            Err(_) => InvocationErrorKind::Panicked,
        };

        let error = failure(target.id, target.type_name, method, kind);
        warn!(error = %error, "Ordered invocation stopped");
        return Err(error);
    }

    info!(method, services = called, "Ordered invocation complete");
    Ok(())
}

/// Start `method` on every service at once.
///
/// Must be called from within a tokio runtime. Resolves once every call has
/// succeeded, or with the first failure to complete; the other calls keep
/// running.
pub async fn invoke(
    container: &Container,
    method: &str,
    args: Vec<Value>,
) -> Result<(), InvocationError> {
    let args: Args = args.into();
    let mut running = FuturesUnordered::new();
    let mut rejected = None;

    for target in by_order(container) {
        let call = match prepare(&target, method, &args) {
            None => continue,
            Some(Ok(call)) => call,
            Some(Err(error)) => {
                rejected.get_or_insert(error);
                continue;
            }
        };

        debug!(service = target.type_name, id = %target.id, method, "Spawning");
        let handle = tokio::spawn(call);
        running.push(async move { (target.id, target.type_name, handle.await) });
    }

    if let Some(error) = rejected {
        warn!(error = %error, pending = running.len(), "Parallel invocation failed");
        return Err(error);
    }

    let started = running.len();
    while let Some((id, type_name, joined)) = running.next().await {
        let kind = match joined {
            Ok(Ok(())) => continue,
            Ok(Err(err)) => InvocationErrorKind::Failed(err),
            Err(_) => InvocationErrorKind::Panicked,
        };

        let error = failure(id, type_name, method, kind);
        warn!(error = %error, pending = running.len(), "Parallel invocation failed");
        return Err(error);
    }

    info!(method, services = started, "Parallel invocation complete");
    Ok(())
}
