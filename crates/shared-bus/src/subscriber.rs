//! # Subscriptions
//!
//! Handles returned to listeners and the async stream adapter used by
//! observers that live outside the dispatching thread.

use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tokio_stream::Stream;
use tracing::debug;

use crate::events::ChangeEvent;
use crate::publisher::{detach_from, ListenerId, ListenerTable};

/// Handle to one listener registration.
pub struct Subscription {
    id: ListenerId,

    /// Listener table of the bus this subscription belongs to.
    listeners: ListenerTable,
}

impl Subscription {
    pub(crate) fn new(id: ListenerId, listeners: ListenerTable) -> Self {
        Self { id, listeners }
    }

    #[must_use]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Remove the listener. Calling it again does nothing.
    pub fn unsubscribe(&self) {
        detach_from(&self.listeners, self.id);
    }

    /// Whether the listener is still registered.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.listeners.read().iter().any(|(id, _)| *id == self.id)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Async stream of [`ChangeEvent`]s.
///
/// Detaches its listener when dropped.
pub struct ChangeStream {
    subscription: Subscription,
    receiver: mpsc::UnboundedReceiver<ChangeEvent>,
}

impl ChangeStream {
    pub(crate) fn new(
        subscription: Subscription,
        receiver: mpsc::UnboundedReceiver<ChangeEvent>,
    ) -> Self {
        Self {
            subscription,
            receiver,
        }
    }

    /// Receive the next event.
    ///
    /// Returns `None` once the listener has been detached and the queue is
    /// drained.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.receiver.recv().await
    }

    /// Take the next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        self.receiver.try_recv().ok()
    }

    #[must_use]
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }
}

impl Stream for ChangeStream {
    type Item = ChangeEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for ChangeStream {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
        debug!(listener = %self.subscription.id(), "Change stream dropped");
    }
}
