//! Cart line items and catalog entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ProductId, RemoteId};
use super::price::Price;

/// A product as exposed by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub stock_quantity: u32,
}

/// One line of a cart.
///
/// There is no quantity: presence of a product implies quantity one, and a
/// product id appears at most once per cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub unit_price: Price,
    pub category: String,
    #[serde(default)]
    pub image_ref: Option<String>,
    pub added_at: DateTime<Utc>,
    /// Set once the line has been mirrored to the remote cart.
    #[serde(default)]
    pub remote_id: Option<RemoteId>,
}

impl CartItem {
    /// Build an unsynced cart line from a catalog product.
    #[must_use]
    pub fn from_product(product: &ProductDetail, added_at: DateTime<Utc>) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            unit_price: product.price,
            category: product.category.clone(),
            image_ref: product.image_url.clone(),
            added_at,
            remote_id: None,
        }
    }

    /// Whether the line carries a remote id.
    #[must_use]
    pub const fn is_synced(&self) -> bool {
        self.remote_id.is_some()
    }
}

/// One line of a remote cart, as listed by the cart service.
///
/// `product` is the joined catalog entry; it can be absent when the product
/// was removed from the catalog after being added to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCartEntry {
    pub remote_id: RemoteId,
    pub product_id: ProductId,
    pub added_at: DateTime<Utc>,
    #[serde(default)]
    pub product: Option<ProductDetail>,
}

impl RemoteCartEntry {
    /// Convert into a local cart line linked to this remote entry.
    ///
    /// Returns `None` when the entry has no product detail to build from.
    #[must_use]
    pub fn to_cart_item(&self) -> Option<CartItem> {
        self.product.as_ref().map(|product| CartItem {
            remote_id: Some(self.remote_id.clone()),
            ..CartItem::from_product(product, self.added_at)
        })
    }
}

/// Aggregate view of a cart for badges and checkout pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub items: Vec<CartItem>,
    pub count: usize,
    pub total: Price,
    pub is_empty: bool,
}

impl CartSummary {
    /// Summarize a list of items.
    #[must_use]
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let total = items.iter().map(|item| item.unit_price).sum();
        Self {
            count: items.len(),
            is_empty: items.is_empty(),
            total,
            items,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::CurrencyCode;
    use rust_decimal::Decimal;

    fn product(id: &str, cents: i64) -> ProductDetail {
        ProductDetail {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: None,
            price: Price::from_minor_units(cents, CurrencyCode::USD).unwrap(),
            category: "misc".to_string(),
            image_url: Some(format!("/img/{id}.png")),
            stock_quantity: 3,
        }
    }

    #[test]
    fn test_from_product_is_unsynced() {
        let item = CartItem::from_product(&product("p1", 100), Utc::now());
        assert_eq!(item.product_id.as_str(), "p1");
        assert_eq!(item.image_ref.as_deref(), Some("/img/p1.png"));
        assert!(!item.is_synced());
    }

    #[test]
    fn test_remote_entry_to_cart_item_links_remote_id() {
        let entry = RemoteCartEntry {
            remote_id: RemoteId::new("r-1"),
            product_id: ProductId::new("p1"),
            added_at: Utc::now(),
            product: Some(product("p1", 100)),
        };
        let item = entry.to_cart_item().unwrap();
        assert_eq!(item.remote_id, Some(RemoteId::new("r-1")));
        assert_eq!(item.added_at, entry.added_at);
    }

    #[test]
    fn test_remote_entry_without_detail() {
        let entry = RemoteCartEntry {
            remote_id: RemoteId::new("r-1"),
            product_id: ProductId::new("gone"),
            added_at: Utc::now(),
            product: None,
        };
        assert!(entry.to_cart_item().is_none());
    }

    #[test]
    fn test_summary() {
        let items = vec![
            CartItem::from_product(&product("p1", 100), Utc::now()),
            CartItem::from_product(&product("p2", 250), Utc::now()),
        ];
        let summary = CartSummary::from_items(items);
        assert_eq!(summary.count, 2);
        assert!(!summary.is_empty);
        assert_eq!(summary.total.amount(), Decimal::new(350, 2));
    }

    #[test]
    fn test_cart_item_json_shape() {
        let item = CartItem::from_product(&product("p1", 100), Utc::now());
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["productId"], "p1");
        assert!(json["remoteId"].is_null());
        assert_eq!(json["unitPrice"]["amount"], "1.00");
    }
}
