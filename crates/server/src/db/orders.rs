//! Order repository.

use chrono::Utc;

use cartsync_core::{OrderConfirmation, OrderId, Price, UserId};

use super::Database;
use crate::catalog::Catalog;

/// Repository for orders.
pub struct OrderRepository<'a> {
    db: &'a Database,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Turn `user`'s cart into an order and empty the cart.
    ///
    /// Runs under one write lock, so a concurrent add lands either in the
    /// order or in the next cart. Lines whose product left the catalog are
    /// dropped. Returns `None` if nothing orderable is in the cart.
    pub async fn place_from_cart(
        &self,
        user: &UserId,
        catalog: &Catalog,
        shipping_address: &str,
    ) -> Option<OrderConfirmation> {
        let mut tables = self.db.tables.write().await;
        let items: Vec<_> = tables
            .carts
            .get(user)?
            .iter()
            .filter_map(|line| catalog.get(&line.product_id).cloned())
            .collect();
        if items.is_empty() {
            return None;
        }

        let order = OrderConfirmation {
            order_id: OrderId::generate(),
            total: items.iter().map(|p| p.price).sum::<Price>(),
            items,
            shipping_address: shipping_address.to_string(),
            placed_at: Utc::now(),
        };
        tables.carts.remove(user);
        tables
            .orders
            .entry(user.clone())
            .or_default()
            .push(order.clone());
        Some(order)
    }

    /// Orders placed by `user`, oldest first.
    pub async fn list(&self, user: &UserId) -> Vec<OrderConfirmation> {
        let tables = self.db.tables.read().await;
        tables.orders.get(user).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cartsync_core::ProductId;

    use super::*;
    use crate::db::CartRepository;

    #[tokio::test]
    async fn test_place_empties_cart() {
        let db = Database::new();
        let catalog = Catalog::sample();
        let user = UserId::new("u1");
        let carts = CartRepository::new(&db);
        carts.add(&user, &ProductId::new("1")).await.unwrap();
        carts.add(&user, &ProductId::new("2")).await.unwrap();

        let orders = OrderRepository::new(&db);
        let order = orders
            .place_from_cart(&user, &catalog, "1 Main St")
            .await
            .unwrap();

        assert_eq!(order.items.len(), 2);
        assert_eq!(order.total.amount(), rust_decimal::Decimal::new(1178, 0));
        assert!(carts.list(&user).await.is_empty());
        assert_eq!(orders.list(&user).await, vec![order]);
    }

    #[tokio::test]
    async fn test_empty_cart_places_nothing() {
        let db = Database::new();
        let orders = OrderRepository::new(&db);
        assert!(
            orders
                .place_from_cart(&UserId::new("u1"), &Catalog::sample(), "1 Main St")
                .await
                .is_none()
        );
    }
}
