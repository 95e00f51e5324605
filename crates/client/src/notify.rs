//! Cart change notifications.
//!
//! A typed, in-process publish/subscribe channel. UI fragments such as a
//! cart-count badge subscribe once and get called with the full cart after
//! every mutation, so nothing has to poll.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use cartsync_core::CartItem;

type Callback = Arc<dyn Fn(&[CartItem]) + Send + Sync>;

/// Broadcasts the cart contents to subscribers.
///
/// Cloning yields another handle to the same subscriber list.
#[derive(Clone, Default)]
pub struct ChangeNotifier {
    registry: Arc<Mutex<Registry>>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: Vec<(u64, Callback)>,
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl ChangeNotifier {
    /// Create a notifier with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback`. It stays registered until the returned
    /// [`Subscription`] is unsubscribed or dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&[CartItem]) + Send + Sync + 'static,
    {
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.subscribers.push((id, Arc::new(callback)));

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Call every subscriber once, in subscription order.
    ///
    /// The registry lock is released before callbacks run, so a callback may
    /// subscribe or unsubscribe without deadlocking.
    pub fn publish(&self, cart: &[CartItem]) {
        let callbacks: Vec<Callback> = lock(&self.registry)
            .subscribers
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in callbacks {
            callback(cart);
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        lock(&self.registry).subscribers.len()
    }
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle returned by [`ChangeNotifier::subscribe`].
///
/// Dropping it unsubscribes. Call [`Subscription::detach`] to keep the
/// callback registered for the notifier's whole lifetime.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Stop receiving notifications.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Keep the callback registered without holding the handle.
    pub fn detach(self) {
        std::mem::forget(self);
    }

    fn remove(&self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry)
                .subscribers
                .retain(|(id, _)| *id != self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove();
    }
}
