//! Cart facade that mirrors local changes to the remote cart.
//!
//! All mutations hit the [`LocalCart`] first and unconditionally, so a guest
//! (or an offline user) never waits on the network. When a session exists the
//! change is then mirrored remotely; mirroring failures are logged and
//! swallowed because the next reconciliation picks up whatever was missed.
//!
//! Only [`CartSync::checkout`] surfaces remote failures, since the user is
//! waiting on it.

use cartsync_core::{
    CartItem, ErrorCode, OrderConfirmation, ProductId, ReconciliationResult, UserInfo,
};
use secrecy::SecretString;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::local::LocalCart;
use crate::reconcile::{ReconcileError, ReconcileReport, Reconciler};
use crate::remote::{Checkout, RemoteCart, RemoteError};
use crate::session::Session;
use crate::storage::KeyValueStore;

/// Failures of a user-initiated checkout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("please sign in to check out")]
    SignInRequired,

    #[error("your cart is empty")]
    EmptyCart,

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Local cart, session and remote cart bundled together.
#[derive(Debug)]
pub struct CartSync<S, R> {
    cart: LocalCart<S>,
    session: Session<S>,
    remote: R,
    reconciler: Reconciler,
}

impl<S, R> CartSync<S, R>
where
    S: KeyValueStore,
    R: RemoteCart,
{
    pub fn new(cart: LocalCart<S>, session: Session<S>, remote: R) -> Self {
        Self {
            cart,
            session,
            remote,
            reconciler: Reconciler::new(),
        }
    }

    #[must_use]
    pub const fn with_reconciler(mut self, reconciler: Reconciler) -> Self {
        self.reconciler = reconciler;
        self
    }

    #[must_use]
    pub const fn cart(&self) -> &LocalCart<S> {
        &self.cart
    }

    #[must_use]
    pub const fn session(&self) -> &Session<S> {
        &self.session
    }

    #[must_use]
    pub const fn remote(&self) -> &R {
        &self.remote
    }

    /// Add `item` locally, then mirror it when signed in.
    ///
    /// Returns the local result: `false` if the product was already in the cart.
    #[instrument(skip_all, fields(product_id = %item.product_id))]
    pub async fn add(&mut self, item: CartItem) -> bool {
        let product_id = item.product_id.clone();
        if !self.cart.add(item) {
            return false;
        }
        if !self.session.is_authenticated() {
            return true;
        }

        let guard = self.session.guard();
        match self.remote.add(&product_id).await {
            Ok(remote_id) if self.session.is_current(&guard) => {
                self.cart.set_remote_id(&product_id, remote_id);
            }
            Ok(_) => debug!("Session changed before mirror completed; not linking"),
            Err(RemoteError::AlreadyPresent) => {
                debug!("Already in remote cart; next reconciliation links it");
            }
            Err(e) => log_mirror_failure("add", &e),
        }
        true
    }

    /// Remove `product_id` locally, then mirror it when signed in.
    #[instrument(skip(self))]
    pub async fn remove(&mut self, product_id: &ProductId) -> bool {
        if !self.cart.remove(product_id) {
            return false;
        }
        if !self.session.is_authenticated() {
            return true;
        }

        match self.remote.remove(product_id).await {
            Ok(()) => {}
            Err(RemoteError::NotFound(_)) => debug!("Not in remote cart; nothing to remove"),
            Err(e) => log_mirror_failure("remove", &e),
        }
        true
    }

    /// Empty the local cart, then the remote one when signed in.
    #[instrument(skip(self))]
    pub async fn clear(&mut self) {
        self.cart.clear();
        if !self.session.is_authenticated() {
            return;
        }
        if let Err(e) = self.remote.clear().await {
            log_mirror_failure("clear", &e);
        }
    }

    /// Record a sign-in and reconcile once.
    ///
    /// Returns `None` when reconciliation could not run; the failure is logged.
    #[instrument(skip_all, fields(user_id = %user.id))]
    pub async fn login(&mut self, token: SecretString, user: UserInfo) -> Option<ReconcileReport> {
        self.session.login(token, user);
        match self.refresh().await {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(error = %e, "Cart reconciliation after sign-in failed");
                None
            }
        }
    }

    /// Forget the session and empty the local cart. The remote cart is kept.
    pub fn logout(&mut self) {
        self.session.logout();
        self.cart.clear();
    }

    /// Run a reconciliation pass now.
    ///
    /// # Errors
    ///
    /// See [`Reconciler::run`].
    pub async fn refresh(&mut self) -> Result<ReconcileReport, ReconcileError> {
        self.reconciler
            .run(&mut self.cart, &self.remote, &self.session)
            .await
    }

    /// Diff the carts without changing either.
    ///
    /// # Errors
    ///
    /// [`ReconcileError::Unauthenticated`] when signed out, otherwise
    /// [`ReconcileError::List`] if the remote cart cannot be listed.
    pub async fn status(&self) -> Result<ReconciliationResult, ReconcileError> {
        if !self.session.is_authenticated() {
            return Err(ReconcileError::Unauthenticated);
        }
        let listing = self.remote.list().await.map_err(ReconcileError::List)?;
        Ok(Reconciler::compare(&self.cart, &listing))
    }
}

impl<S, R> CartSync<S, R>
where
    S: KeyValueStore,
    R: RemoteCart + Checkout,
{
    /// Reconcile, then turn the remote cart into an order.
    ///
    /// The local cart is cleared once the order is placed.
    ///
    /// # Errors
    ///
    /// Every failure is returned; nothing is swallowed here.
    #[instrument(skip_all)]
    pub async fn checkout(&mut self, shipping_address: &str) -> Result<OrderConfirmation, CheckoutError> {
        if !self.session.is_authenticated() {
            return Err(CheckoutError::SignInRequired);
        }
        if self.cart.count() == 0 {
            return Err(CheckoutError::EmptyCart);
        }

        let report = self.refresh().await.map_err(|e| match e {
            ReconcileError::Unauthenticated | ReconcileError::List(RemoteError::Unauthorized) => {
                CheckoutError::SignInRequired
            }
            ReconcileError::List(e) => CheckoutError::Remote(e),
        })?;
        if report.aborted {
            return Err(CheckoutError::SignInRequired);
        }
        if let Some((product_id, e)) = report.failed.into_iter().next() {
            warn!(product_id = %product_id, error = %e, "Cart not fully synced; refusing checkout");
            return Err(CheckoutError::Remote(e));
        }

        let guard = self.session.guard();
        let order = self
            .remote
            .place_order(shipping_address)
            .await
            .map_err(|e| match e {
                RemoteError::Unauthorized => CheckoutError::SignInRequired,
                RemoteError::Rejected {
                    code: ErrorCode::EmptyCart,
                    ..
                } => CheckoutError::EmptyCart,
                e => CheckoutError::Remote(e),
            })?;

        info!(order_id = %order.order_id, total = %order.total, "Order placed");
        if self.session.is_current(&guard) {
            self.cart.clear();
        }
        Ok(order)
    }
}

fn log_mirror_failure(operation: &str, error: &RemoteError) {
    match error {
        RemoteError::Unauthorized => {
            info!(operation, "Remote cart needs a fresh sign-in; change kept locally");
        }
        e => warn!(operation, error = %e, "Failed to mirror cart change; change kept locally"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cartsync_core::{Email, UserId};
    use chrono::Utc;

    use super::*;
    use crate::remote::testing::{FakeRemoteCart, product};
    use crate::storage::MemoryStore;

    fn user() -> UserInfo {
        UserInfo {
            id: UserId::new("u1"),
            email: Email::parse("u1@shop.test").unwrap(),
            display_name: Some("Ada".to_string()),
        }
    }

    fn item(id: &str) -> CartItem {
        CartItem::from_product(&product(id, 2500), Utc::now())
    }

    fn sync_with(remote: FakeRemoteCart) -> CartSync<MemoryStore, FakeRemoteCart> {
        let store = MemoryStore::new();
        CartSync::new(
            LocalCart::open(store.clone()),
            Session::restore(store),
            remote,
        )
    }

    fn catalog() -> FakeRemoteCart {
        FakeRemoteCart::with_catalog(["p1", "p2", "p3"].map(|id| product(id, 2500)))
    }

    #[tokio::test]
    async fn test_guest_add_stays_local() {
        let mut sync = sync_with(catalog());
        assert!(sync.add(item("p1")).await);
        assert!(!sync.add(item("p1")).await);

        assert_eq!(sync.cart().count(), 1);
        assert!(sync.remote().add_calls().is_empty());
    }

    #[tokio::test]
    async fn test_signed_in_add_is_mirrored_and_linked() {
        let mut sync = sync_with(catalog());
        sync.login(SecretString::from("tok"), user()).await.unwrap();

        assert!(sync.add(item("p1")).await);

        let line = sync.cart().find(&ProductId::new("p1")).unwrap();
        assert_eq!(line.remote_id, sync.remote().remote_id_of("p1"));
        assert!(line.is_synced());
    }

    #[tokio::test]
    async fn test_mirror_failure_is_swallowed() {
        let remote = catalog();
        remote.fail_add("p1", RemoteError::Network("offline".to_string()));
        let mut sync = sync_with(remote);
        sync.login(SecretString::from("tok"), user()).await.unwrap();

        assert!(sync.add(item("p1")).await);
        assert!(!sync.cart().find(&ProductId::new("p1")).unwrap().is_synced());
    }

    #[tokio::test]
    async fn test_late_mirror_not_applied_after_logout() {
        let store = MemoryStore::new();
        let session = Session::restore(store.clone());
        let other_handle = session.clone();
        let remote = catalog().with_on_add(move |_| other_handle.invalidate());
        let mut sync = CartSync::new(LocalCart::open(store), session, remote);
        sync.login(SecretString::from("tok"), user()).await.unwrap();

        assert!(sync.add(item("p1")).await);
        assert!(!sync.cart().find(&ProductId::new("p1")).unwrap().is_synced());
    }

    #[tokio::test]
    async fn test_remove_tolerates_remote_not_found() {
        let mut sync = sync_with(catalog());
        sync.login(SecretString::from("tok"), user()).await.unwrap();
        sync.add(item("p1")).await;
        sync.add(item("p2")).await;
        sync.remote().remove(&ProductId::new("p1")).await.unwrap();

        assert!(sync.remove(&ProductId::new("p1")).await);
        assert!(sync.remove(&ProductId::new("p2")).await);
        assert!(!sync.remove(&ProductId::new("p2")).await);
        assert!(sync.remote().product_ids().is_empty());
    }

    #[tokio::test]
    async fn test_login_merges_guest_cart() {
        let remote = catalog();
        remote.seed("p3");
        let mut sync = sync_with(remote);
        sync.add(item("p1")).await;
        sync.add(item("p2")).await;

        let report = sync.login(SecretString::from("tok"), user()).await.unwrap();

        assert_eq!(report.pushed.len(), 2);
        assert_eq!(report.pulled, vec![ProductId::new("p3")]);
        assert_eq!(sync.cart().count(), 3);
        assert!(!sync.status().await.unwrap().needs_sync);
    }

    #[tokio::test]
    async fn test_login_with_unreachable_remote_keeps_cart() {
        let remote = catalog();
        remote.fail_list(RemoteError::Network("offline".to_string()));
        let mut sync = sync_with(remote);
        sync.add(item("p1")).await;

        assert!(sync.login(SecretString::from("tok"), user()).await.is_none());
        assert!(sync.session().is_authenticated());
        assert_eq!(sync.cart().count(), 1);
    }

    #[tokio::test]
    async fn test_logout_clears_cart_and_session() {
        let mut sync = sync_with(catalog());
        sync.login(SecretString::from("tok"), user()).await.unwrap();
        sync.add(item("p1")).await;

        sync.logout();

        assert!(!sync.session().is_authenticated());
        assert_eq!(sync.cart().count(), 0);
        assert_eq!(sync.remote().product_ids(), vec![ProductId::new("p1")]);
    }

    #[tokio::test]
    async fn test_clear_mirrors_when_signed_in() {
        let mut sync = sync_with(catalog());
        sync.login(SecretString::from("tok"), user()).await.unwrap();
        sync.add(item("p1")).await;

        sync.clear().await;

        assert_eq!(sync.cart().count(), 0);
        assert!(sync.remote().product_ids().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_requires_sign_in() {
        let mut sync = sync_with(catalog());
        sync.add(item("p1")).await;
        assert_eq!(
            sync.checkout("1 Main St").await.unwrap_err(),
            CheckoutError::SignInRequired
        );
        assert_eq!(sync.cart().count(), 1);
    }

    #[tokio::test]
    async fn test_checkout_rejects_empty_cart() {
        let mut sync = sync_with(catalog());
        sync.login(SecretString::from("tok"), user()).await.unwrap();
        assert_eq!(
            sync.checkout("1 Main St").await.unwrap_err(),
            CheckoutError::EmptyCart
        );
    }

    #[tokio::test]
    async fn test_checkout_syncs_then_orders_and_clears() {
        let mut sync = sync_with(catalog());
        sync.add(item("p1")).await;
        sync.add(item("p2")).await;
        sync.session().login(SecretString::from("tok"), user());

        let order = sync.checkout("1 Main St").await.unwrap();

        assert_eq!(order.items.len(), 2);
        assert_eq!(order.total.to_string(), "$50.00");
        assert_eq!(sync.cart().count(), 0);
        assert!(sync.remote().product_ids().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_surfaces_remote_failure() {
        let remote = catalog();
        remote.fail_place_order(RemoteError::Server {
            status: 503,
            message: "maintenance".to_string(),
        });
        let mut sync = sync_with(remote);
        sync.login(SecretString::from("tok"), user()).await.unwrap();
        sync.add(item("p1")).await;

        let err = sync.checkout("1 Main St").await.unwrap_err();

        assert!(matches!(err, CheckoutError::Remote(RemoteError::Server { status: 503, .. })));
        assert_eq!(sync.cart().count(), 1);
    }

    #[tokio::test]
    async fn test_checkout_refuses_partially_synced_cart() {
        let remote = catalog();
        remote.fail_add("p2", RemoteError::Network("reset".to_string()));
        let mut sync = sync_with(remote);
        sync.add(item("p1")).await;
        sync.add(item("p2")).await;
        sync.session().login(SecretString::from("tok"), user());

        let err = sync.checkout("1 Main St").await.unwrap_err();

        assert_eq!(err, CheckoutError::Remote(RemoteError::Network("reset".to_string())));
        assert_eq!(sync.cart().count(), 2);
    }
}
