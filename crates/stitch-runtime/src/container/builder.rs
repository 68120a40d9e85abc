//! # Container Builder
//!
//! Turns a [`ServiceRegistry`] into a [`Container`].
//!
//! ## Build Phases
//!
//! ```text
//! Phase 1: Instantiate       one instance per registered type, in
//!                            registration order; wires are set aside
//! Phase 2: Resolve wiring    bind every wire to the container; reads are
//!                            looked up at access time from now on
//! Phase 3: Instrument        bind each observable field to (id, key, bus)
//! ```
//!
//! Any failure aborts the build. Nothing is retried: a missing service or
//! field is a wiring mistake in the program, not a runtime condition.

use std::collections::HashMap;
use std::sync::Arc;

use shared_bus::ChangeBus;
use shared_types::{ContainerError, ServiceId, WireReference};
use tracing::{debug, info, instrument};

use super::{Container, ContainerInner, ServiceEntry};
use crate::registry::ServiceRegistry;
use crate::wiring::{ContainerSlot, Wiring};

#[instrument(name = "container_build", skip(registry), fields(services = registry.len()))]
pub(crate) fn build(registry: &ServiceRegistry) -> Result<Container, ContainerError> {
    info!("Building service container");

    // =====================================================================
    // PHASE 1: Instantiate
    // =====================================================================
    info!("Phase 1: Instantiating services");

    let slot = ContainerSlot::new();
    let bus = ChangeBus::new();
    let mut entries = Vec::with_capacity(registry.len());
    let mut by_type = HashMap::with_capacity(registry.len());
    let mut pending: Vec<(ServiceId, WireReference)> = Vec::new();

    for registered in registry.services() {
        let id = registered.id();
        let mut wiring = Wiring::new(registry, id, slot.clone());

        let (service, any) = (registered.constructor())(&mut wiring).map_err(|err| {
            match err.downcast::<ContainerError>() {
                Ok(config_error) => config_error,
                Err(source) => ContainerError::Construction {
                    type_name: registered.type_name(),
                    source,
                },
            }
        })?;

        let wires = wiring.into_pending();
        debug!(
            service = registered.type_name(),
            id = %id,
            wires = wires.len(),
            "Service instantiated"
        );
        pending.extend(wires.into_iter().map(|wire| (id, wire)));

        by_type.insert(registered.type_id(), id);
        entries.push(ServiceEntry {
            descriptor: registry.descriptor_of(registered),
            id,
            type_name: registered.type_name(),
            service,
            any,
        });
    }

    let inner = Arc::new(ContainerInner {
        entries,
        by_type,
        bus,
    });

    // =====================================================================
    // PHASE 2: Resolve wiring
    // =====================================================================
    info!("Phase 2: Resolving {} wire(s)", pending.len());

    for (owner, wire) in &pending {
        let target = inner.entry(wire.target)?;
        debug!(
            from = %owner,
            to = %wire.target,
            target_type = target.type_name,
            "Wire resolved"
        );
    }
    slot.bind(&inner);

    // =====================================================================
    // PHASE 3: Instrument
    // =====================================================================
    info!("Phase 3: Instrumenting observable fields");

    let mut instrumented = 0usize;
    for entry in &inner.entries {
        let declared = entry
            .descriptor
            .observable_keys
            .iter()
            .chain(entry.descriptor.persisted_keys.iter());

        for key in declared {
            let field = entry.service.field(key).ok_or_else(|| ContainerError::UnknownField {
                service: entry.type_name,
                field: key.clone(),
            })?;

            if entry.descriptor.is_observable(key) && field.instrument(entry.id, key, &inner.bus) {
                instrumented += 1;
            }
        }
    }

    info!(
        services = inner.entries.len(),
        wires = pending.len(),
        observables = instrumented,
        "Service container ready"
    );

    Ok(Container::from_inner(inner))
}
