//! Reconciliation and checkout commands.

#![allow(clippy::print_stdout)]

use cartsync_client::ReconcileError;

use super::account::print_report;
use super::{CliError, Context};

/// Reconcile the local cart with the account cart.
///
/// # Errors
///
/// Returns `CliError::NotSignedIn` without a session, or `CliError::Reconcile`
/// if the account cart cannot be read.
pub async fn sync(ctx: &mut Context) -> Result<(), CliError> {
    match ctx.cart_mut().refresh().await {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(ReconcileError::Unauthenticated) => Err(CliError::NotSignedIn),
        Err(e) => Err(e.into()),
    }
}

/// Print which products differ between the local and account carts.
///
/// # Errors
///
/// Returns `CliError::NotSignedIn` without a session.
pub async fn status(ctx: &Context) -> Result<(), CliError> {
    let result = match ctx.cart().status().await {
        Ok(result) => result,
        Err(ReconcileError::Unauthenticated) => return Err(CliError::NotSignedIn),
        Err(e) => return Err(e.into()),
    };

    if !result.needs_sync {
        println!("In sync ({} item(s)).", result.common.len());
        return Ok(());
    }
    for product_id in &result.local_only {
        println!("  local only:  {product_id}");
    }
    for product_id in &result.remote_only {
        println!("  remote only: {product_id}");
    }
    println!("Run `cartsync sync` to reconcile.");
    Ok(())
}

/// Place an order from the cart.
///
/// # Errors
///
/// Returns `CliError::Checkout` if the order could not be placed.
pub async fn checkout(ctx: &mut Context, shipping_address: &str) -> Result<(), CliError> {
    let order = ctx.cart_mut().checkout(shipping_address).await?;

    println!("Order {} placed.", order.order_id);
    for item in &order.items {
        println!("  {:<28} {:>10}", item.name, item.price.to_string());
    }
    println!("Total {}, shipping to {}", order.total, order.shipping_address);
    Ok(())
}
