//! Command implementations.
//!
//! Every command opens the same [`Context`]: the local cart and session
//! persisted under `CARTSYNC_DATA_DIR`, and an HTTP client for the cart
//! service. Nothing touches the network until a command needs it.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod sync;

use cartsync_client::{
    CartSync, CheckoutError, ClientConfig, ConfigError, FileStore, HttpRemoteCart, LocalCart,
    ReconcileError, RemoteError, Session, StorageError,
};
use thiserror::Error;

/// Errors surfaced to the user.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Remote(#[from] RemoteError),

    #[error("sync failed: {0}")]
    Reconcile(#[from] ReconcileError),

    #[error("checkout failed: {0}")]
    Checkout(#[from] CheckoutError),

    #[error("unknown product: {0}")]
    UnknownProduct(String),

    #[error("not signed in; run `cartsync login` first")]
    NotSignedIn,
}

/// The cart as the CLI drives it.
pub type Cart = CartSync<FileStore, HttpRemoteCart<FileStore>>;

/// Everything a command needs.
pub struct Context {
    store: FileStore,
    cart: Cart,
}

impl Context {
    /// Load configuration and open the persisted cart and session.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Config` for invalid environment variables.
    pub fn open() -> Result<Self, CliError> {
        let config = ClientConfig::from_env()?;
        let store = FileStore::new(&config.data_dir);
        let session = Session::restore(store.clone());
        let remote = HttpRemoteCart::new(&config, session.clone())?;
        let cart = CartSync::new(LocalCart::open(store.clone()), session, remote);
        Ok(Self { store, cart })
    }

    /// Build a context over an existing store and cart.
    #[cfg(test)]
    pub const fn from_parts(store: FileStore, cart: Cart) -> Self {
        Self { store, cart }
    }

    #[must_use]
    pub const fn store(&self) -> &FileStore {
        &self.store
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    pub const fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }
}
