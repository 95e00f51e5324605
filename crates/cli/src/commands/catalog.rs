//! Catalog commands.
//!
//! Every successful listing is saved under the `catalog` slot so that
//! `cart add` can resolve products while the service is unreachable.

#![allow(clippy::print_stdout)]

use cartsync_client::{KeyValueStore, RemoteCart, RemoteError};
use cartsync_core::{ProductDetail, ProductId};

use super::{CliError, Context};

/// Storage slot holding the last fetched catalog.
pub const CATALOG_KEY: &str = "catalog";

/// Print the catalog.
///
/// # Errors
///
/// Returns `CliError::Remote` if the catalog cannot be fetched.
pub async fn list(ctx: &Context) -> Result<(), CliError> {
    let products = ctx.cart().remote().catalog().await?;
    save_snapshot(ctx, &products);

    for product in &products {
        println!(
            "{:>4}  {:<28} {:>10}  {}",
            product.id.as_str(),
            product.name,
            product.price.to_string(),
            product.category
        );
    }
    Ok(())
}

/// Look up `product_id`, falling back to the saved catalog when offline.
///
/// # Errors
///
/// Returns `CliError::UnknownProduct` if no catalog has the product.
pub async fn resolve(ctx: &Context, product_id: &ProductId) -> Result<ProductDetail, CliError> {
    match ctx.cart().remote().product(product_id).await {
        Ok(Some(product)) => Ok(product),
        Ok(None) => Err(CliError::UnknownProduct(product_id.to_string())),
        Err(e @ (RemoteError::Network(_) | RemoteError::Server { .. })) => {
            tracing::warn!(error = %e, "Catalog unreachable, using saved copy");
            snapshot(ctx)?
                .into_iter()
                .find(|product| &product.id == product_id)
                .ok_or(CliError::Remote(e))
        }
        Err(e) => Err(e.into()),
    }
}

fn save_snapshot(ctx: &Context, products: &[ProductDetail]) {
    let result = serde_json::to_string(products)
        .map_err(|e| e.to_string())
        .and_then(|raw| {
            ctx.store()
                .write(CATALOG_KEY, &raw)
                .map_err(|e| e.to_string())
        });
    if let Err(e) = result {
        tracing::warn!(error = %e, "Failed to save catalog");
    }
}

/// The last saved catalog; empty if none was saved or it is unreadable.
///
/// # Errors
///
/// Returns `CliError::Storage` if the store cannot be read.
pub fn snapshot(ctx: &Context) -> Result<Vec<ProductDetail>, CliError> {
    let Some(raw) = ctx.store().read(CATALOG_KEY)? else {
        return Ok(Vec::new());
    };
    Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Ignoring unreadable saved catalog");
        Vec::new()
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use cartsync_client::{CartSync, ClientConfig, FileStore, HttpRemoteCart, LocalCart, Session};
    use cartsync_core::{CurrencyCode, Price};

    use super::*;

    fn product(id: &str, cents: i64) -> ProductDetail {
        ProductDetail {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: None,
            price: Price::from_minor_units(cents, CurrencyCode::USD).unwrap(),
            category: "test".to_string(),
            image_url: None,
            stock_quantity: 1,
        }
    }

    /// A context whose service address refuses connections.
    fn offline_context(dir: &std::path::Path) -> Context {
        let vars: HashMap<&str, String> = HashMap::from([
            ("CARTSYNC_API_URL", "http://127.0.0.1:9".to_string()),
            ("CARTSYNC_DATA_DIR", dir.display().to_string()),
            ("CARTSYNC_REQUEST_TIMEOUT_SECS", "2".to_string()),
        ]);
        let config = ClientConfig::from_lookup(|key| vars.get(key).cloned()).unwrap();
        let store = FileStore::new(&config.data_dir);
        let session = Session::restore(store.clone());
        let remote = HttpRemoteCart::new(&config, session.clone()).unwrap();
        let cart = CartSync::new(LocalCart::open(store.clone()), session, remote);
        Context::from_parts(store, cart)
    }

    #[test]
    fn test_snapshot_empty_when_never_saved() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = offline_context(dir.path());
        assert!(snapshot(&ctx).unwrap().is_empty());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = offline_context(dir.path());
        let products = vec![product("1", 500), product("2", 250)];
        save_snapshot(&ctx, &products);
        assert_eq!(snapshot(&ctx).unwrap(), products);
    }

    #[test]
    fn test_corrupt_snapshot_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = offline_context(dir.path());
        ctx.store().write(CATALOG_KEY, "{not json").unwrap();
        assert!(snapshot(&ctx).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_falls_back_to_snapshot_offline() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = offline_context(dir.path());
        save_snapshot(&ctx, &[product("1", 500)]);

        let found = resolve(&ctx, &ProductId::new("1")).await.unwrap();
        assert_eq!(found.name, "Product 1");

        let err = resolve(&ctx, &ProductId::new("2")).await.unwrap_err();
        assert!(matches!(err, CliError::Remote(RemoteError::Network(_))));
    }

    #[tokio::test]
    async fn test_guest_add_works_offline() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = offline_context(dir.path());
        save_snapshot(&ctx, &[product("1", 500)]);

        crate::commands::cart::add(&mut ctx, &ProductId::new("1"))
            .await
            .unwrap();
        assert_eq!(ctx.cart().cart().count(), 1);

        // A fresh context sees the persisted cart.
        let reopened = offline_context(dir.path());
        assert!(reopened.cart().cart().contains(&ProductId::new("1")));
    }
}
