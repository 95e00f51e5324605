//! In-memory storage for the cart service.
//!
//! # Tables
//!
//! - `users` - Accounts with argon2 password hashes
//! - `carts` - One remote cart per user, at most one line per product
//! - `orders` - Orders placed from a cart
//!
//! State lives for the lifetime of the process. Repositories borrow the
//! [`Database`] and take its lock per call; no lock is held across an await.

pub mod carts;
pub mod orders;
pub mod users;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use cartsync_core::{Email, OrderConfirmation, UserId};

pub use carts::{CartLine, CartRepository};
pub use orders::OrderRepository;
pub use users::UserRepository;

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The row does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Shared handle to all tables. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct Database {
    tables: Arc<RwLock<Tables>>,
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, users::UserRow>,
    user_emails: HashMap<Email, UserId>,
    carts: HashMap<UserId, Vec<CartLine>>,
    orders: HashMap<UserId, Vec<OrderConfirmation>>,
}

impl Database {
    /// Create an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
