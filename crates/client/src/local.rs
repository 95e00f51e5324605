//! Local cart store.
//!
//! The cart the user sees before (and after) signing in. It lives in a
//! [`KeyValueStore`] slot as a JSON array, works with zero network access,
//! and never fails towards its caller: unreadable state reads as an empty
//! cart and failed writes are logged while the in-memory view carries on.

use cartsync_core::{CartItem, CartSummary, Price, ProductId, RemoteCartEntry, RemoteId};
use tracing::{debug, warn};

use crate::notify::{ChangeNotifier, Subscription};
use crate::storage::KeyValueStore;

/// Storage key holding the serialized cart.
pub const CART_KEY: &str = "shopping_cart";

/// Ordered, product-unique list of cart lines backed by a storage slot.
#[derive(Debug)]
pub struct LocalCart<S> {
    store: S,
    items: Vec<CartItem>,
    notifier: ChangeNotifier,
}

impl<S: KeyValueStore> LocalCart<S> {
    /// Load the cart from `store` with a fresh notifier.
    pub fn open(store: S) -> Self {
        Self::with_notifier(store, ChangeNotifier::new())
    }

    /// Load the cart from `store`, publishing changes through `notifier`.
    pub fn with_notifier(store: S, notifier: ChangeNotifier) -> Self {
        let items = load(&store);
        Self {
            store,
            items,
            notifier,
        }
    }

    /// Current cart contents in insertion order.
    #[must_use]
    pub fn get(&self) -> &[CartItem] {
        &self.items
    }

    /// Append `item` unless its product is already in the cart.
    ///
    /// Returns `false` (and changes nothing) for a duplicate product id.
    pub fn add(&mut self, item: CartItem) -> bool {
        if self.contains(&item.product_id) {
            debug!(product_id = %item.product_id, "Product already in local cart");
            return false;
        }

        debug!(product_id = %item.product_id, "Adding product to local cart");
        self.items.push(item);
        self.commit();
        true
    }

    /// Remove the line for `product_id`. Returns whether a line was removed.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.product_id != product_id);
        if self.items.len() == before {
            return false;
        }

        debug!(product_id = %product_id, "Removed product from local cart");
        self.commit();
        true
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
        if let Err(e) = self.store.remove(CART_KEY) {
            warn!(error = %e, "Failed to clear persisted cart; keeping in-memory state");
        }
        self.notifier.publish(&self.items);
    }

    /// Attach `remote_id` to the line for `product_id`.
    ///
    /// Returns `false` if the product is not in the cart.
    pub fn set_remote_id(&mut self, product_id: &ProductId, remote_id: RemoteId) -> bool {
        let Some(item) = self
            .items
            .iter_mut()
            .find(|item| &item.product_id == product_id)
        else {
            return false;
        };

        debug!(product_id = %product_id, remote_id = %remote_id, "Linked local line to remote cart");
        item.remote_id = Some(remote_id);
        self.commit();
        true
    }

    /// Add a line pulled from the remote cart, keeping its remote id.
    ///
    /// Returns `false` if the entry carries no product detail or the product
    /// is already present. Existing local content is never overwritten.
    pub fn merge_remote(&mut self, entry: &RemoteCartEntry) -> bool {
        entry.to_cart_item().is_some_and(|item| self.add(item))
    }

    /// Whether the cart holds `product_id`.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.items.iter().any(|item| &item.product_id == product_id)
    }

    /// Look up the line for `product_id`.
    #[must_use]
    pub fn find(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }

    /// Number of lines.
    #[must_use]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Sum of unit prices.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(|item| item.unit_price).sum()
    }

    /// Snapshot for badges and the cart page.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        CartSummary::from_items(self.items.clone())
    }

    /// Product ids in insertion order.
    pub fn product_ids(&self) -> impl Iterator<Item = &ProductId> {
        self.items.iter().map(|item| &item.product_id)
    }

    /// Lines not yet mirrored to the remote cart.
    pub fn unsynced(&self) -> impl Iterator<Item = &CartItem> {
        self.items.iter().filter(|item| !item.is_synced())
    }

    /// The notifier this cart publishes to.
    #[must_use]
    pub const fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    /// Shorthand for `self.notifier().subscribe(callback)`.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&[CartItem]) + Send + Sync + 'static,
    {
        self.notifier.subscribe(callback)
    }

    /// Persist, then notify.
    fn commit(&self) {
        match serde_json::to_string(&self.items) {
            Ok(json) => {
                if let Err(e) = self.store.write(CART_KEY, &json) {
                    warn!(error = %e, "Failed to persist cart; keeping in-memory state");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize cart"),
        }
        self.notifier.publish(&self.items);
    }
}

/// Read the cart slot, falling back to an empty cart on any problem.
fn load<S: KeyValueStore>(store: &S) -> Vec<CartItem> {
    let raw = match store.read(CART_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!(error = %e, "Cart storage unreadable, starting with an empty cart");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<CartItem>>(&raw) {
        Ok(items) => dedupe(items),
        Err(e) => {
            warn!(error = %e, "Stored cart is corrupted, starting with an empty cart");
            Vec::new()
        }
    }
}

/// Keep the first line per product id; stored data may predate the invariant.
fn dedupe(items: Vec<CartItem>) -> Vec<CartItem> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.product_id.clone()))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use cartsync_core::CurrencyCode;
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::*;
    use crate::storage::MemoryStore;

    fn item(id: &str, cents: i64) -> CartItem {
        CartItem {
            product_id: ProductId::new(id),
            name: format!("Product {id}"),
            description: None,
            unit_price: Price::from_minor_units(cents, CurrencyCode::USD).unwrap(),
            category: "misc".to_string(),
            image_ref: None,
            added_at: Utc::now(),
            remote_id: None,
        }
    }

    fn ids<S: KeyValueStore>(cart: &LocalCart<S>) -> Vec<&str> {
        cart.product_ids().map(ProductId::as_str).collect()
    }

    #[test]
    fn test_add_get_clear_scenario() {
        let mut cart = LocalCart::open(MemoryStore::new());
        assert!(cart.get().is_empty());

        assert!(cart.add(item("p1", 10000)));
        assert_eq!(cart.get().len(), 1);
        assert_eq!(cart.total().amount(), Decimal::new(100, 0));

        cart.clear();
        assert!(cart.get().is_empty());
    }

    #[test]
    fn test_duplicate_add_is_a_no_op() {
        let mut cart = LocalCart::open(MemoryStore::new());
        assert!(cart.add(item("x", 100)));
        let once = cart.get().to_vec();

        assert!(!cart.add(item("x", 999)));
        assert_eq!(cart.get(), once.as_slice());
    }

    #[test]
    fn test_uniqueness_over_add_sequences() {
        let mut cart = LocalCart::open(MemoryStore::new());
        for id in ["a", "b", "a", "c", "b", "a"] {
            cart.add(item(id, 100));
        }
        assert_eq!(ids(&cart), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_remove_is_total() {
        let mut cart = LocalCart::open(MemoryStore::new());
        assert!(!cart.remove(&ProductId::new("missing")));
        assert!(cart.get().is_empty());

        cart.add(item("a", 100));
        assert!(!cart.remove(&ProductId::new("missing")));
        assert_eq!(ids(&cart), vec!["a"]);

        assert!(cart.remove(&ProductId::new("a")));
        assert!(cart.get().is_empty());
    }

    #[test]
    fn test_set_remote_id() {
        let mut cart = LocalCart::open(MemoryStore::new());
        assert!(!cart.set_remote_id(&ProductId::new("a"), RemoteId::new("r1")));

        cart.add(item("a", 100));
        assert!(cart.set_remote_id(&ProductId::new("a"), RemoteId::new("r1")));
        assert_eq!(
            cart.find(&ProductId::new("a")).unwrap().remote_id,
            Some(RemoteId::new("r1"))
        );
        assert_eq!(cart.unsynced().count(), 0);
    }

    #[test]
    fn test_persists_across_reopen() {
        let store = MemoryStore::new();
        let mut cart = LocalCart::open(store.clone());
        cart.add(item("a", 100));
        cart.add(item("b", 200));
        cart.set_remote_id(&ProductId::new("b"), RemoteId::new("r-b"));

        let reopened = LocalCart::open(store);
        assert_eq!(ids(&reopened), vec!["a", "b"]);
        assert!(reopened.find(&ProductId::new("b")).unwrap().is_synced());
    }

    #[test]
    fn test_corrupted_storage_reads_as_empty() {
        let store = MemoryStore::new();
        store.write(CART_KEY, "{not json").unwrap();
        let cart = LocalCart::open(store);
        assert!(cart.get().is_empty());
    }

    #[test]
    fn test_unavailable_storage_is_soft() {
        let store = MemoryStore::new();
        store.set_unavailable(true);

        let mut cart = LocalCart::open(store.clone());
        assert!(cart.get().is_empty());
        assert!(cart.add(item("a", 100)));
        assert_eq!(ids(&cart), vec!["a"]);
        cart.clear();
        assert!(cart.get().is_empty());
    }

    #[test]
    fn test_stored_duplicates_are_collapsed() {
        let store = MemoryStore::new();
        let json = serde_json::to_string(&vec![item("a", 100), item("a", 200)]).unwrap();
        store.write(CART_KEY, &json).unwrap();

        let cart = LocalCart::open(store);
        assert_eq!(cart.count(), 1);
        assert_eq!(cart.total().amount(), Decimal::new(100, 2));
    }

    #[test]
    fn test_notification_per_mutation_with_post_state() {
        let mut cart = LocalCart::open(MemoryStore::new());
        let seen: Arc<Mutex<Vec<Vec<String>>>> = Arc::default();
        let sink = Arc::clone(&seen);
        let _subscription = cart.subscribe(move |items| {
            sink.lock()
                .unwrap()
                .push(items.iter().map(|i| i.product_id.to_string()).collect());
        });

        cart.add(item("a", 100));
        cart.add(item("b", 100));
        cart.add(item("c", 100));

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                vec!["a".to_string()],
                vec!["a".to_string(), "b".to_string()],
                vec!["a".to_string(), "b".to_string(), "c".to_string()],
            ]
        );
    }

    #[test]
    fn test_notification_after_persist() {
        let store = MemoryStore::new();
        let mut cart = LocalCart::open(store.clone());
        let persisted: Arc<Mutex<Vec<Option<String>>>> = Arc::default();
        let sink = Arc::clone(&persisted);
        let reader = store.clone();
        let _subscription = cart.subscribe(move |_| {
            sink.lock().unwrap().push(reader.read(CART_KEY).unwrap());
        });

        cart.add(item("a", 100));
        cart.clear();

        let persisted = persisted.lock().unwrap();
        assert!(persisted[0].as_deref().unwrap().contains("\"productId\":\"a\""));
        assert!(persisted[1].is_none());
    }

    #[test]
    fn test_no_notification_for_no_ops() {
        let mut cart = LocalCart::open(MemoryStore::new());
        cart.add(item("a", 100));

        let calls = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&calls);
        let _subscription = cart.subscribe(move |_| *sink.lock().unwrap() += 1);

        cart.add(item("a", 100));
        cart.remove(&ProductId::new("zzz"));
        cart.set_remote_id(&ProductId::new("zzz"), RemoteId::new("r"));
        assert_eq!(*calls.lock().unwrap(), 0);

        cart.set_remote_id(&ProductId::new("a"), RemoteId::new("r"));
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_merge_remote_keeps_local_content() {
        let mut cart = LocalCart::open(MemoryStore::new());
        cart.add(item("a", 100));

        let mut remote_item = item("a", 999);
        remote_item.name = "Renamed".to_string();
        let entry = RemoteCartEntry {
            remote_id: RemoteId::new("r-a"),
            product_id: ProductId::new("a"),
            added_at: Utc::now(),
            product: Some(cartsync_core::ProductDetail {
                id: ProductId::new("a"),
                name: "Renamed".to_string(),
                description: None,
                price: remote_item.unit_price,
                category: "misc".to_string(),
                image_url: None,
                stock_quantity: 1,
            }),
        };

        assert!(!cart.merge_remote(&entry));
        assert_eq!(cart.find(&ProductId::new("a")).unwrap().name, "Product a");
    }
}
