//! # Change Bus
//!
//! The publishing side: listener registration and synchronous dispatch.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use shared_types::ServiceId;
use tokio::sync::mpsc;
use tracing::debug;

use crate::events::{ChangeEvent, EventFilter};
use crate::subscriber::{ChangeStream, Subscription};

/// Callback invoked for every dispatched change.
pub type Listener = Arc<dyn Fn(ServiceId, &str, &Value) + Send + Sync>;

/// Handle identifying one listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

pub(crate) type ListenerTable = Arc<RwLock<Vec<(ListenerId, Listener)>>>;

/// In-memory, synchronous change bus.
///
/// Cloning is cheap and every clone shares the same listener table.
#[derive(Clone)]
pub struct ChangeBus {
    /// Registered listeners in registration order.
    listeners: ListenerTable,

    /// Next listener id.
    next_id: Arc<AtomicU64>,

    /// Total events dispatched.
    events_dispatched: Arc<AtomicU64>,
}

impl ChangeBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(0)),
            events_dispatched: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Register `callback` for every future dispatch.
    ///
    /// The returned [`Subscription`] removes exactly this registration.
    /// Dropping it without calling [`Subscription::unsubscribe`] keeps the
    /// listener registered.
    pub fn listen<F>(&self, callback: F) -> Subscription
    where
        F: Fn(ServiceId, &str, &Value) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Arc::new(callback)));

        debug!(listener = %id, "Listener registered");

        Subscription::new(id, Arc::clone(&self.listeners))
    }

    /// Register `callback` for events matching `filter` only.
    pub fn listen_filtered<F>(&self, filter: EventFilter, callback: F) -> Subscription
    where
        F: Fn(ServiceId, &str, &Value) + Send + Sync + 'static,
    {
        self.listen(move |id, key, value| {
            if filter.matches(id, key) {
                callback(id, key, value);
            }
        })
    }

    /// Remove a listener. Removing one that is already gone does nothing.
    pub fn detach(&self, id: ListenerId) {
        detach_from(&self.listeners, id);
    }

    /// Deliver `(id, key, value)` to every listener, in registration order.
    ///
    /// Returns the number of listeners invoked.
    pub fn dispatch(&self, id: ServiceId, key: &str, value: &Value) -> usize {
        let snapshot: Vec<Listener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        self.events_dispatched.fetch_add(1, Ordering::Relaxed);

        for listener in &snapshot {
            listener(id, key, value);
        }

        debug!(
            service = %id,
            property = key,
            receivers = snapshot.len(),
            "Change dispatched"
        );

        snapshot.len()
    }

    /// Stream of events matching `filter`.
    ///
    /// Events are queued without bound; dropping the stream detaches it.
    #[must_use]
    pub fn stream(&self, filter: EventFilter) -> ChangeStream {
        let (sender, receiver) = mpsc::unbounded_channel();
        let subscription = self.listen_filtered(filter, move |id, key, value| {
            // A closed receiver means the stream is being dropped.
            let _ = sender.send(ChangeEvent::new(id, key, value.clone()));
        });

        ChangeStream::new(subscription, receiver)
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Total number of dispatches since creation.
    #[must_use]
    pub fn events_dispatched(&self) -> u64 {
        self.events_dispatched.load(Ordering::Relaxed)
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ChangeBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeBus")
            .field("listeners", &self.listener_count())
            .field("events_dispatched", &self.events_dispatched())
            .finish()
    }
}

pub(crate) fn detach_from(listeners: &ListenerTable, id: ListenerId) {
    let mut listeners = listeners.write();
    if let Some(idx) = listeners.iter().position(|(entry, _)| *entry == id) {
        listeners.remove(idx);
        debug!(listener = %id, "Listener detached");
    }
}
