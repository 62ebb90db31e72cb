//! Callback registry for workspace event subscriptions.
//!
//! Subscribers receive [`WorkspaceEvent`] notifications when the synced
//! workspace changes locally or when a backend confirmation settles.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::events::WorkspaceEvent;

/// A unique identifier for a subscription.
pub type SubscriptionId = u64;

/// Callback function type for workspace events.
///
/// Callbacks run synchronously on the emitting thread and should not block.
pub type EventCallback = Arc<dyn Fn(&WorkspaceEvent) + Send + Sync>;

/// Thread-safe registry of event subscribers.
///
/// Callbacks are invoked in subscription order, outside the registry lock, so
/// a callback may subscribe or unsubscribe while handling an event. Such
/// changes take effect from the next emit.
///
/// # Example
///
/// ```ignore
/// use soroban_ide_core::callback_registry::CallbackRegistry;
/// use std::sync::Arc;
///
/// let registry = CallbackRegistry::new();
/// let id = registry.subscribe(Arc::new(|event| println!("{:?}", event)));
/// registry.unsubscribe(id);
/// ```
pub struct CallbackRegistry {
    callbacks: RwLock<BTreeMap<SubscriptionId, EventCallback>>,
    next_id: AtomicU64,
}

impl CallbackRegistry {
    /// Create a new empty callback registry.
    pub fn new() -> Self {
        Self {
            callbacks: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Subscribe to workspace events.
    ///
    /// Returns a subscription ID that can be used to unsubscribe later.
    pub fn subscribe(&self, callback: EventCallback) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut callbacks = self.callbacks.write().unwrap_or_else(|e| e.into_inner());
        callbacks.insert(id, callback);
        id
    }

    /// Returns `true` if the subscription was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut callbacks = self.callbacks.write().unwrap_or_else(|e| e.into_inner());
        callbacks.remove(&id).is_some()
    }

    /// Deliver `event` to every subscriber registered when the call starts.
    ///
    /// A panicking callback is logged and skipped.
    pub fn emit(&self, event: &WorkspaceEvent) {
        let snapshot: Vec<(SubscriptionId, EventCallback)> = self
            .callbacks
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(id, cb)| (*id, Arc::clone(cb)))
            .collect();
        for (id, callback) in snapshot {
            let outcome =
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| callback(event)));
            if outcome.is_err() {
                log::error!("[CallbackRegistry] subscriber {} panicked on {:?}", id, event);
            }
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.callbacks
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Drop every subscription.
    pub fn clear(&self) {
        self.callbacks
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("subscriber_count", &self.subscriber_count())
            .field("next_id", &self.next_id.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_every_subscriber_sees_each_event() {
        let registry = CallbackRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let hits = Arc::clone(&hits);
            registry.subscribe(Arc::new(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            }));
        }

        registry.emit(&WorkspaceEvent::NodeDeleted { path: "a".into() });
        registry.emit(&WorkspaceEvent::NodeDeleted { path: "b".into() });
        assert_eq!(hits.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_unsubscribe_twice() {
        let registry = CallbackRegistry::new();
        let id = registry.subscribe(Arc::new(|_| {}));
        assert!(registry.unsubscribe(id));
        assert!(!registry.unsubscribe(id));
        assert_eq!(registry.subscriber_count(), 0);
    }

    #[test]
    fn test_callback_can_unsubscribe_itself() {
        let registry = Arc::new(CallbackRegistry::new());
        let own_id = Arc::new(AtomicU64::new(0));

        let weak = Arc::downgrade(&registry);
        let id_slot = Arc::clone(&own_id);
        let id = registry.subscribe(Arc::new(move |_| {
            if let Some(registry) = weak.upgrade() {
                registry.unsubscribe(id_slot.load(Ordering::SeqCst));
            }
        }));
        own_id.store(id, Ordering::SeqCst);

        registry.emit(&WorkspaceEvent::ContentChanged { path: "x".into() });
        assert_eq!(registry.subscriber_count(), 0);
    }

    #[test]
    fn test_panicking_callback_does_not_block_others() {
        let registry = CallbackRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        registry.subscribe(Arc::new(|_| panic!("subscriber bug")));
        let seen_clone = Arc::clone(&seen);
        registry.subscribe(Arc::new(move |event| {
            seen_clone.lock().unwrap().push(event.clone());
        }));

        registry.emit(&WorkspaceEvent::ContentChanged { path: "x".into() });
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
