//! Event sink bridge
//!
//! Holds at most one UI listener. `subscribe` replaces any previous listener,
//! `unsubscribe` clears unconditionally, and publishing with nobody attached
//! is a silent no-op: the UI may detach while telephony events are still in
//! flight.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::events::SessionEvent;

/// UI-side consumer of session events
pub trait SessionEventListener: Send + Sync {
    fn on_event(&self, event: SessionEvent);
}

/// Listener that forwards events into a tokio channel
pub struct ChannelEventListener {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelEventListener {
    pub fn new(tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { tx }
    }
}

impl SessionEventListener for ChannelEventListener {
    fn on_event(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("Event receiver dropped; discarding session event");
        }
    }
}

/// Single-subscriber fan-out point for session events
#[derive(Default)]
pub struct EventSinkBridge {
    listener: RwLock<Option<Arc<dyn SessionEventListener>>>,
}

impl EventSinkBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `listener`, replacing any current one
    pub fn subscribe(&self, listener: Arc<dyn SessionEventListener>) {
        let previous = self.listener.write().replace(listener);
        if previous.is_some() {
            tracing::debug!("Replaced existing session event listener");
        }
    }

    /// Attach a channel listener and return its receiving end
    pub fn subscribe_channel(&self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribe(Arc::new(ChannelEventListener::new(tx)));
        rx
    }

    /// Detach the current listener, if any
    pub fn unsubscribe(&self) {
        self.listener.write().take();
    }

    pub fn has_listener(&self) -> bool {
        self.listener.read().is_some()
    }

    /// Deliver `event` to the current listener, if any
    pub fn publish(&self, event: SessionEvent) {
        // Clone out so the listener runs without the lock held; it may
        // resubscribe or unsubscribe from inside the callback.
        let listener = self.listener.read().clone();
        match listener {
            Some(listener) => {
                tracing::trace!(event = event.name(), state = %event.state(), "Publishing session event");
                listener.on_event(event);
            }
            None => {
                tracing::trace!(event = event.name(), "No listener attached; dropping session event");
            }
        }
    }
}

impl fmt::Debug for EventSinkBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSinkBridge")
            .field("subscribed", &self.has_listener())
            .finish()
    }
}
