//! Local cart commands.
//!
//! These work for guests and offline; when signed in, changes are mirrored
//! to the account cart on a best-effort basis.

#![allow(clippy::print_stdout)]

use chrono::Utc;

use cartsync_core::{CartItem, ProductId};

use super::{CliError, Context, catalog};

/// Print every cart line.
pub fn list(ctx: &Context) {
    let items = ctx.cart().cart().get();
    if items.is_empty() {
        println!("Your cart is empty.");
        return;
    }
    for item in items {
        let marker = if item.is_synced() { ' ' } else { '*' };
        println!(
            "{marker}{:>4}  {:<28} {:>10}",
            item.product_id.as_str(),
            item.name,
            item.unit_price.to_string()
        );
    }
    if ctx.cart().session().is_authenticated() && items.iter().any(|item| !item.is_synced()) {
        println!("(* not yet in your account cart; run `cartsync sync`)");
    }
}

/// Add a product by id.
///
/// # Errors
///
/// Returns `CliError` if the product cannot be resolved.
pub async fn add(ctx: &mut Context, product_id: &ProductId) -> Result<(), CliError> {
    let product = catalog::resolve(ctx, product_id).await?;
    let name = product.name.clone();
    if ctx
        .cart_mut()
        .add(CartItem::from_product(&product, Utc::now()))
        .await
    {
        println!("Added {name}.");
    } else {
        println!("{name} is already in your cart.");
    }
    Ok(())
}

/// Remove a product by id.
pub async fn remove(ctx: &mut Context, product_id: &ProductId) {
    if ctx.cart_mut().remove(product_id).await {
        println!("Removed {product_id}.");
    } else {
        println!("{product_id} is not in your cart.");
    }
}

/// Remove every item.
pub async fn clear(ctx: &mut Context) {
    ctx.cart_mut().clear().await;
    println!("Cart cleared.");
}

/// Print the item count and total.
pub fn summary(ctx: &Context) {
    let summary = ctx.cart().cart().summary();
    if summary.is_empty {
        println!("Your cart is empty.");
    } else {
        println!("{} item(s), total {}", summary.count, summary.total);
    }
}
