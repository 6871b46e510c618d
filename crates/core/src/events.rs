//! Event subscription registry over the six fixed life-cycle channels.
//!
//! Dispatch is logically single-threaded: all events flow through the
//! session's `run()` loop, so no two listener invocations for the same bus
//! ever overlap, whatever thread the loop happens to run on. Delivery
//! preserves engine emission order and registration order within a
//! channel.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use arbridge_protocol::{EventKind, SessionEvent};
use parking_lot::Mutex;

type Listener = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

struct Registered {
    id: u64,
    listener: Listener,
    /// Tombstone checked immediately before invocation, so a removal that
    /// races an in-flight dispatch still wins.
    removed: Arc<AtomicBool>,
}

#[derive(Default)]
struct BusInner {
    next_id: AtomicU64,
    channels: Mutex<HashMap<EventKind, Vec<Registered>>>,
}

/// Subscription registry for session life-cycle events.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` on one of the six channels. The returned
    /// [`Subscription`] is the only way to remove it; dropping the handle
    /// leaves the listener registered.
    pub fn subscribe(
        &self,
        kind: EventKind,
        listener: impl Fn(&SessionEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let removed = Arc::new(AtomicBool::new(false));
        self.inner
            .channels
            .lock()
            .entry(kind)
            .or_default()
            .push(Registered {
                id,
                listener: Arc::new(listener),
                removed: Arc::clone(&removed),
            });
        tracing::debug!(target: "arbridge.events", channel = %kind, id, "listener registered");
        Subscription {
            bus: Arc::downgrade(&self.inner),
            kind,
            id,
            removed,
        }
    }

    /// Remove every listener registered on `kind`.
    pub fn unsubscribe_all(&self, kind: EventKind) {
        let mut channels = self.inner.channels.lock();
        if let Some(registered) = channels.get_mut(&kind) {
            for entry in registered.iter() {
                entry.removed.store(true, Ordering::SeqCst);
            }
            let count = registered.len();
            registered.clear();
            tracing::debug!(target: "arbridge.events", channel = %kind, count, "channel cleared");
        }
    }

    /// Deliver `event` to every live listener on its channel, in
    /// registration order. Listeners run outside the registry lock so a
    /// listener may subscribe or unsubscribe reentrantly.
    pub fn dispatch(&self, event: &SessionEvent) {
        let snapshot: Vec<(Listener, Arc<AtomicBool>)> = {
            let channels = self.inner.channels.lock();
            match channels.get(&event.kind()) {
                Some(registered) => registered
                    .iter()
                    .map(|r| (Arc::clone(&r.listener), Arc::clone(&r.removed)))
                    .collect(),
                None => return,
            }
        };
        for (listener, removed) in snapshot {
            if !removed.load(Ordering::SeqCst) {
                listener(event);
            }
        }
    }

    #[cfg(test)]
    fn listener_count(&self, kind: EventKind) -> usize {
        self.inner
            .channels
            .lock()
            .get(&kind)
            .map_or(0, |v| v.len())
    }
}

/// Caller-owned handle binding one listener to one channel.
///
/// Holds its own identity and a weak reference to the owning bus, so
/// removal cannot double-release and outliving the bus is harmless.
pub struct Subscription {
    bus: Weak<BusInner>,
    kind: EventKind,
    id: u64,
    removed: Arc<AtomicBool>,
}

impl Subscription {
    /// The channel this subscription listens on.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Whether `remove` has already been called (directly or via
    /// [`EventBus::unsubscribe_all`]).
    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::SeqCst)
    }

    /// Unregister the listener. Idempotent: the first call removes, every
    /// later call is a no-op. The listener never fires after this returns.
    pub fn remove(&self) {
        if self.removed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(bus) = self.bus.upgrade() {
            let mut channels = bus.channels.lock();
            if let Some(registered) = channels.get_mut(&self.kind) {
                registered.retain(|r| r.id != self.id);
            }
            tracing::debug!(target: "arbridge.events", channel = %self.kind, id = self.id, "listener removed");
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("removed", &self.is_removed())
            .finish()
    }
}
