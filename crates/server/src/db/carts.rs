//! Remote cart repository.
//!
//! A user's cart is created implicitly by the first add and holds at most
//! one line per product.

use chrono::{DateTime, Utc};

use cartsync_core::{ProductId, RemoteId, UserId};

use super::{Database, RepositoryError};

/// One stored cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub remote_id: RemoteId,
    pub product_id: ProductId,
    pub added_at: DateTime<Utc>,
}

/// Repository for per-user carts.
pub struct CartRepository<'a> {
    db: &'a Database,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// All lines of `user`'s cart, oldest first.
    pub async fn list(&self, user: &UserId) -> Vec<CartLine> {
        let tables = self.db.tables.read().await;
        tables.carts.get(user).cloned().unwrap_or_default()
    }

    /// Add `product_id` to `user`'s cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the product is already in the cart.
    pub async fn add(&self, user: &UserId, product_id: &ProductId) -> Result<CartLine, RepositoryError> {
        let mut tables = self.db.tables.write().await;
        let lines = tables.carts.entry(user.clone()).or_default();
        if lines.iter().any(|line| &line.product_id == product_id) {
            return Err(RepositoryError::Conflict(format!(
                "product {product_id} already in cart"
            )));
        }

        let line = CartLine {
            remote_id: RemoteId::generate(),
            product_id: product_id.clone(),
            added_at: Utc::now(),
        };
        lines.push(line.clone());
        Ok(line)
    }

    /// Remove the line for `product_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product is not in the cart.
    pub async fn remove(&self, user: &UserId, product_id: &ProductId) -> Result<(), RepositoryError> {
        let mut tables = self.db.tables.write().await;
        let lines = tables.carts.entry(user.clone()).or_default();
        let before = lines.len();
        lines.retain(|line| &line.product_id != product_id);
        if lines.len() == before {
            return Err(RepositoryError::NotFound(format!(
                "product {product_id} not in cart"
            )));
        }
        Ok(())
    }

    /// Remove every line from `user`'s cart.
    pub async fn clear(&self, user: &UserId) {
        let mut tables = self.db.tables.write().await;
        tables.carts.remove(user);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_is_unique_per_product() {
        let db = Database::new();
        let carts = CartRepository::new(&db);
        let user = UserId::new("u1");
        let p1 = ProductId::new("1");

        let line = carts.add(&user, &p1).await.unwrap();
        assert_eq!(line.product_id, p1);
        assert!(matches!(
            carts.add(&user, &p1).await,
            Err(RepositoryError::Conflict(_))
        ));
        assert_eq!(carts.list(&user).await, vec![line]);
    }

    #[tokio::test]
    async fn test_carts_are_per_user() {
        let db = Database::new();
        let carts = CartRepository::new(&db);
        carts.add(&UserId::new("u1"), &ProductId::new("1")).await.unwrap();

        assert!(carts.list(&UserId::new("u2")).await.is_empty());
        carts.add(&UserId::new("u2"), &ProductId::new("1")).await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let db = Database::new();
        let carts = CartRepository::new(&db);
        let user = UserId::new("u1");
        carts.add(&user, &ProductId::new("1")).await.unwrap();
        carts.add(&user, &ProductId::new("2")).await.unwrap();

        carts.remove(&user, &ProductId::new("1")).await.unwrap();
        assert!(matches!(
            carts.remove(&user, &ProductId::new("1")).await,
            Err(RepositoryError::NotFound(_))
        ));
        assert_eq!(carts.list(&user).await.len(), 1);

        carts.clear(&user).await;
        assert!(carts.list(&user).await.is_empty());
    }
}
