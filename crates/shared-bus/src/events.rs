//! # Change Events
//!
//! The single event type carried by the bus and the filter used to select
//! events for a stream or a scoped listener.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::ServiceId;

/// A field of a service changed to `value`.
///
/// Only produced when the new value differs from the stored one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Service that owns the field.
    pub service_id: ServiceId,
    /// Field name as declared in the descriptor.
    pub property: String,
    /// New value.
    pub value: Value,
}

impl ChangeEvent {
    #[must_use]
    pub fn new(service_id: ServiceId, property: impl Into<String>, value: Value) -> Self {
        Self {
            service_id,
            property: property.into(),
            value,
        }
    }
}

/// Filter for selecting events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Services to include. Empty means all services.
    pub services: Vec<ServiceId>,
    /// Properties to include. Empty means all properties.
    pub properties: Vec<String>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for events from specific services.
    #[must_use]
    pub fn services(services: Vec<ServiceId>) -> Self {
        Self {
            services,
            properties: Vec::new(),
        }
    }

    /// Create a filter for a single field of a single service.
    #[must_use]
    pub fn field(service: ServiceId, property: impl Into<String>) -> Self {
        Self {
            services: vec![service],
            properties: vec![property.into()],
        }
    }

    /// Restrict this filter to `property` as well.
    #[must_use]
    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.properties.push(property.into());
        self
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, service_id: ServiceId, property: &str) -> bool {
        let service_match = self.services.is_empty() || self.services.contains(&service_id);
        let property_match =
            self.properties.is_empty() || self.properties.iter().any(|p| p == property);

        service_match && property_match
    }

    /// Check a whole [`ChangeEvent`].
    #[must_use]
    pub fn matches_event(&self, event: &ChangeEvent) -> bool {
        self.matches(event.service_id, &event.property)
    }
}
