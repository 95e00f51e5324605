//! Cartsync Client - Local-first cart with remote reconciliation.
//!
//! The cart lives on the client and works with zero network access. Once a
//! user signs in, the [`Reconciler`] merges it with the per-user cart held by
//! the cart service, and [`CartSync`] mirrors every later change.
//!
//! # Modules
//!
//! - [`storage`] - Key-value persistence backends (memory, files)
//! - [`local`] - The local cart store
//! - [`notify`] - Cart change publish/subscribe
//! - [`session`] - Auth token and signed-in user
//! - [`remote`] - Remote cart trait and HTTP client
//! - [`reconcile`] - Local/remote merge
//! - [`sync`] - Mirroring facade and checkout
//! - [`config`] - Environment configuration
//!
//! # Example
//!
//! ```rust,ignore
//! let config = ClientConfig::from_env()?;
//! let store = FileStore::new(&config.data_dir);
//! let session = Session::restore(store.clone());
//! let remote = HttpRemoteCart::new(&config, session.clone())?;
//! let mut cart = CartSync::new(LocalCart::open(store), session, remote);
//!
//! cart.add(CartItem::from_product(&product, Utc::now())).await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod local;
pub mod notify;
pub mod reconcile;
pub mod remote;
pub mod session;
pub mod storage;
pub mod sync;

pub use config::{ClientConfig, ConfigError};
pub use local::LocalCart;
pub use notify::{ChangeNotifier, Subscription};
pub use reconcile::{ReconcileError, ReconcileReport, Reconciler};
pub use remote::{Checkout, HttpRemoteCart, RemoteCart, RemoteError};
pub use session::{Session, SessionGuard};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use sync::{CartSync, CheckoutError};
