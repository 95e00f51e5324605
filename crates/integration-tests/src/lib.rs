//! Integration tests for Cartsync.
//!
//! Each test spawns the real server on an ephemeral port and drives it with
//! the real HTTP client, so requests cross TCP exactly as in production.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cartsync-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `reconcile` - Guest cart merges, multi-device convergence, expired sessions
//! - `checkout` - Orders placed through the reconciling facade
//! - `remote_errors` - Status mapping and stale rejections against a scripted server

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::Router;
use cartsync_client::{
    CartSync, ClientConfig, HttpRemoteCart, LocalCart, MemoryStore, ReconcileReport, Session,
};
use cartsync_core::{AuthResponse, CartItem, ProductDetail, ProductId};
use cartsync_server::{AppState, Catalog, TokenService};
use chrono::Utc;
use secrecy::SecretString;
use tokio::task::JoinHandle;
use url::Url;

const TOKEN_SECRET: &str = "kq3Vx9!pR2@mZ7#tL5$wN8^bC4&hJ6*e";

/// Password used for every test account.
pub const PASSWORD: &str = "correct horse";

/// A cart service listening on `127.0.0.1` for the lifetime of the value.
pub struct TestServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server with an empty database and the sample catalog.
    pub async fn spawn() -> Self {
        let state = AppState::new(
            TokenService::new(SecretString::from(TOKEN_SECRET)),
            Catalog::sample(),
        );
        Self::serve(cartsync_server::app(state)).await
    }

    /// Serve an arbitrary router, for scripting responses the real service
    /// never sends on demand.
    pub async fn serve(router: Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("Test server error");
        });

        Self { addr, handle }
    }

    /// Base URL of the running server.
    #[must_use]
    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).expect("Invalid test server URL")
    }

    /// A fresh client install (its own local cart and session) pointed at this server.
    #[must_use]
    pub fn device(&self) -> Device {
        let vars = HashMap::from([("CARTSYNC_API_URL", self.url().to_string())]);
        let config = ClientConfig::from_lookup(|key| vars.get(key).cloned())
            .expect("Invalid test client config");

        let store = MemoryStore::new();
        let session = Session::restore(store.clone());
        let remote = HttpRemoteCart::new(&config, session.clone()).expect("Failed to build client");
        Device {
            cart: CartSync::new(LocalCart::open(store), session, remote),
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// One client install.
pub struct Device {
    pub cart: CartSync<MemoryStore, HttpRemoteCart<MemoryStore>>,
}

impl Device {
    /// Register `email` without signing this device in.
    pub async fn register(&self, email: &str) -> AuthResponse {
        self.cart
            .remote()
            .register(email, &SecretString::from(PASSWORD), None)
            .await
            .expect("Registration failed")
    }

    /// Exchange credentials for a token without signing this device in.
    pub async fn credentials(&self, email: &str) -> AuthResponse {
        self.cart
            .remote()
            .login(email, &SecretString::from(PASSWORD))
            .await
            .expect("Login failed")
    }

    /// Sign in as `email`; returns the reconciliation that followed.
    pub async fn sign_in(&mut self, email: &str) -> ReconcileReport {
        let auth = self.credentials(email).await;
        self.cart
            .login(SecretString::from(auth.token), auth.user)
            .await
            .expect("Reconciliation after sign-in failed")
    }

    /// Fetch `id` from the catalog and add it to the cart.
    pub async fn add(&mut self, id: &str) -> bool {
        let product = self.product(id).await;
        self.cart
            .add(CartItem::from_product(&product, Utc::now()))
            .await
    }

    /// Product ids in the local cart, sorted.
    #[must_use]
    pub fn local_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<_> = self.cart.cart().product_ids().cloned().collect();
        ids.sort();
        ids
    }

    async fn product(&self, id: &str) -> ProductDetail {
        self.cart
            .remote()
            .catalog()
            .await
            .expect("Catalog fetch failed")
            .into_iter()
            .find(|product| product.id.as_str() == id)
            .expect("Unknown sample product")
    }
}

/// Sorted product ids from string literals.
#[must_use]
pub fn ids(raw: &[&str]) -> Vec<ProductId> {
    let mut ids: Vec<_> = raw.iter().map(|id| ProductId::new(*id)).collect();
    ids.sort();
    ids
}
