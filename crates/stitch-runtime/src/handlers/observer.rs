//! # Observer
//!
//! Async view of the change bus for code outside the container.
//!
//! An [`Observer`] yields the changes of a chosen set of services as a
//! [`Stream`] of [`ChangeEvent`]s. An event carrying the same value as the
//! last one seen for its `(service, key)` is dropped, so a consumer only
//! wakes up for real transitions.

use std::collections::HashMap;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use serde_json::Value;
use shared_bus::{ChangeEvent, ChangeStream, EventFilter, ListenerId};
use shared_types::ServiceId;
use tracing::debug;

use crate::container::Container;

/// Stream of distinct changes from selected services.
pub struct Observer {
    stream: ChangeStream,
    last_seen: HashMap<(ServiceId, String), Value>,
}

impl Observer {
    /// Observe `services`, or every service when the list is empty.
    ///
    /// An empty list is a wildcard here rather than "observe nothing"; a
    /// caller that wants no events simply does not create an observer.
    pub fn new(container: &Container, services: &[ServiceId]) -> Self {
        let stream = container
            .bus()
            .stream(EventFilter::services(services.to_vec()));
        debug!(listener = %stream.subscription().id(), services = services.len(), "Observer attached");

        Self {
            stream,
            last_seen: HashMap::new(),
        }
    }

    /// Next distinct change.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            let event = self.stream.recv().await?;
            if self.is_new(&event) {
                return Some(event);
            }
        }
    }

    /// Next distinct change already queued, without waiting.
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        while let Some(event) = self.stream.try_recv() {
            if self.is_new(&event) {
                return Some(event);
            }
        }
        None
    }

    /// Listener backing this observer.
    #[must_use]
    pub fn listener(&self) -> ListenerId {
        self.stream.subscription().id()
    }

    /// Record `event` and report whether it changes the last value seen.
    fn is_new(&mut self, event: &ChangeEvent) -> bool {
        let key = (event.service_id, event.property.clone());
        if self.last_seen.get(&key) == Some(&event.value) {
            return false;
        }
        self.last_seen.insert(key, event.value.clone());
        true
    }
}

impl Stream for Observer {
    type Item = ChangeEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.stream).poll_next(cx) {
                Poll::Ready(Some(event)) => {
                    if self.is_new(&event) {
                        return Poll::Ready(Some(event));
                    }
                }
                other => return other,
            }
        }
    }
}
