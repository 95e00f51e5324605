//! In-memory [`RemoteCart`] with fault injection, for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cartsync_core::{
    CurrencyCode, ErrorCode, OrderConfirmation, OrderId, Price, ProductDetail, ProductId,
    RemoteCartEntry, RemoteId,
};
use chrono::Utc;
use tokio::sync::Barrier;

use super::{Checkout, RemoteCart, RemoteError};

type Hook = Box<dyn Fn(&ProductId) + Send + Sync>;

/// Remote cart double. Entries carry product detail unless hidden.
#[derive(Default)]
pub struct FakeRemoteCart {
    state: Mutex<FakeState>,
    add_barrier: Option<Arc<Barrier>>,
    product_barrier: Option<(HashSet<ProductId>, Arc<Barrier>)>,
    on_add: Option<Hook>,
}

#[derive(Default)]
struct FakeState {
    entries: Vec<RemoteCartEntry>,
    catalog: HashMap<ProductId, ProductDetail>,
    add_failures: HashMap<ProductId, RemoteError>,
    list_failure: Option<RemoteError>,
    place_order_failure: Option<RemoteError>,
    /// Entries left out of the next `list()` response.
    late: HashSet<ProductId>,
    /// Products listed without embedded detail.
    bare: HashSet<ProductId>,
    add_calls: Vec<ProductId>,
    list_calls: usize,
    product_calls: usize,
}

pub fn product(id: &str, cents: i64) -> ProductDetail {
    ProductDetail {
        id: ProductId::new(id),
        name: format!("Product {id}"),
        description: None,
        price: Price::from_minor_units(cents, CurrencyCode::USD).unwrap_or_default(),
        category: "misc".to_string(),
        image_url: None,
        stock_quantity: 10,
    }
}

impl FakeRemoteCart {
    /// Empty cart over a catalog of `products`.
    pub fn with_catalog(products: impl IntoIterator<Item = ProductDetail>) -> Self {
        let fake = Self::default();
        fake.lock().catalog = products.into_iter().map(|p| (p.id.clone(), p)).collect();
        fake
    }

    /// Make every `add` wait until `parties` adds are in flight together.
    #[must_use]
    pub fn with_add_barrier(mut self, parties: usize) -> Self {
        self.add_barrier = Some(Arc::new(Barrier::new(parties)));
        self
    }

    /// Make `product` for each of `ids` wait until all of them are in flight.
    #[must_use]
    pub fn with_product_barrier(mut self, ids: &[&str]) -> Self {
        let ids: HashSet<ProductId> = ids.iter().map(|id| ProductId::new(*id)).collect();
        let barrier = Arc::new(Barrier::new(ids.len()));
        self.product_barrier = Some((ids, barrier));
        self
    }

    /// Run `hook` at the start of every `add`.
    #[must_use]
    pub fn with_on_add(mut self, hook: impl Fn(&ProductId) + Send + Sync + 'static) -> Self {
        self.on_add = Some(Box::new(hook));
        self
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Put `product_id` in the remote cart directly.
    pub fn seed(&self, product_id: &str) -> RemoteId {
        let mut state = self.lock();
        let product_id = ProductId::new(product_id);
        let remote_id = RemoteId::generate();
        let detail = state.catalog.get(&product_id).cloned();
        state.entries.push(RemoteCartEntry {
            remote_id: remote_id.clone(),
            product_id,
            added_at: Utc::now(),
            product: detail,
        });
        remote_id
    }

    /// Seed an entry that the next `list()` does not show yet.
    pub fn seed_late(&self, product_id: &str) -> RemoteId {
        let remote_id = self.seed(product_id);
        self.lock().late.insert(ProductId::new(product_id));
        remote_id
    }

    /// List `product_id` without embedded detail.
    pub fn strip_detail(&self, product_id: &str) {
        self.lock().bare.insert(ProductId::new(product_id));
    }

    /// Drop `product_id` from the catalog.
    pub fn delist(&self, product_id: &str) {
        self.lock().catalog.remove(&ProductId::new(product_id));
    }

    pub fn fail_add(&self, product_id: &str, error: RemoteError) {
        self.lock()
            .add_failures
            .insert(ProductId::new(product_id), error);
    }

    pub fn fail_list(&self, error: RemoteError) {
        self.lock().list_failure = Some(error);
    }

    pub fn fail_place_order(&self, error: RemoteError) {
        self.lock().place_order_failure = Some(error);
    }

    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<_> = self.lock().entries.iter().map(|e| e.product_id.clone()).collect();
        ids.sort();
        ids
    }

    pub fn remote_id_of(&self, product_id: &str) -> Option<RemoteId> {
        self.lock()
            .entries
            .iter()
            .find(|e| e.product_id.as_str() == product_id)
            .map(|e| e.remote_id.clone())
    }

    pub fn add_calls(&self) -> Vec<ProductId> {
        self.lock().add_calls.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.lock().list_calls
    }

    pub fn product_calls(&self) -> usize {
        self.lock().product_calls
    }
}

impl RemoteCart for FakeRemoteCart {
    async fn list(&self) -> Result<Vec<RemoteCartEntry>, RemoteError> {
        let mut state = self.lock();
        state.list_calls += 1;
        if let Some(error) = state.list_failure.clone() {
            return Err(error);
        }

        let late = std::mem::take(&mut state.late);
        Ok(state
            .entries
            .iter()
            .filter(|e| !late.contains(&e.product_id))
            .map(|e| {
                let mut entry = e.clone();
                if state.bare.contains(&e.product_id) {
                    entry.product = None;
                }
                entry
            })
            .collect())
    }

    async fn add(&self, product_id: &ProductId) -> Result<RemoteId, RemoteError> {
        if let Some(hook) = &self.on_add {
            hook(product_id);
        }
        if let Some(barrier) = &self.add_barrier {
            barrier.wait().await;
        }

        let mut state = self.lock();
        state.add_calls.push(product_id.clone());
        if let Some(error) = state.add_failures.get(product_id).cloned() {
            return Err(error);
        }
        if state.entries.iter().any(|e| &e.product_id == product_id) {
            return Err(RemoteError::AlreadyPresent);
        }
        let Some(detail) = state.catalog.get(product_id).cloned() else {
            return Err(RemoteError::NotFound(product_id.to_string()));
        };

        let remote_id = RemoteId::generate();
        state.entries.push(RemoteCartEntry {
            remote_id: remote_id.clone(),
            product_id: product_id.clone(),
            added_at: Utc::now(),
            product: Some(detail),
        });
        Ok(remote_id)
    }

    async fn remove(&self, product_id: &ProductId) -> Result<(), RemoteError> {
        let mut state = self.lock();
        let before = state.entries.len();
        state.entries.retain(|e| &e.product_id != product_id);
        if state.entries.len() == before {
            return Err(RemoteError::NotFound(product_id.to_string()));
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), RemoteError> {
        self.lock().entries.clear();
        Ok(())
    }

    async fn product(&self, product_id: &ProductId) -> Result<Option<ProductDetail>, RemoteError> {
        let gated = self.product_barrier.as_ref().filter(|(ids, _)| ids.contains(product_id));
        if let Some((_, barrier)) = gated {
            barrier.wait().await;
        }

        let mut state = self.lock();
        state.product_calls += 1;
        Ok(state.catalog.get(product_id).cloned())
    }
}

impl Checkout for FakeRemoteCart {
    async fn place_order(&self, shipping_address: &str) -> Result<OrderConfirmation, RemoteError> {
        let mut state = self.lock();
        if let Some(error) = state.place_order_failure.clone() {
            return Err(error);
        }
        if state.entries.is_empty() {
            return Err(RemoteError::Rejected {
                code: ErrorCode::EmptyCart,
                message: "cart is empty".to_string(),
            });
        }

        let entries = std::mem::take(&mut state.entries);
        let items: Vec<ProductDetail> = entries
            .into_iter()
            .filter_map(|e| state.catalog.get(&e.product_id).cloned())
            .collect();
        Ok(OrderConfirmation {
            order_id: OrderId::generate(),
            total: items.iter().map(|p| p.price).sum(),
            items,
            shipping_address: shipping_address.to_string(),
            placed_at: Utc::now(),
        })
    }
}
