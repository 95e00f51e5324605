//! Account commands.

#![allow(clippy::print_stdout)]

use secrecy::SecretString;

use cartsync_client::ReconcileReport;
use cartsync_core::AuthResponse;

use super::{CliError, Context};

/// Create an account, sign in and merge the local cart.
///
/// # Errors
///
/// Returns `CliError::Remote` if the service rejects the registration.
pub async fn register(
    ctx: &mut Context,
    email: &str,
    password: SecretString,
    display_name: Option<String>,
) -> Result<(), CliError> {
    let auth = ctx
        .cart()
        .remote()
        .register(email, &password, display_name)
        .await?;
    sign_in(ctx, auth).await;
    Ok(())
}

/// Sign in and merge the local cart.
///
/// # Errors
///
/// Returns `CliError::Remote` for bad credentials or an unreachable service.
pub async fn login(ctx: &mut Context, email: &str, password: SecretString) -> Result<(), CliError> {
    let auth = ctx.cart().remote().login(email, &password).await?;
    sign_in(ctx, auth).await;
    Ok(())
}

async fn sign_in(ctx: &mut Context, auth: AuthResponse) {
    let name = auth
        .user
        .display_name
        .clone()
        .unwrap_or_else(|| auth.user.email.to_string());
    let report = ctx
        .cart_mut()
        .login(SecretString::from(auth.token), auth.user)
        .await;

    println!("Signed in as {name}.");
    if let Some(report) = report {
        print_report(&report);
    }
}

/// Sign out. The local cart is emptied; the account cart is kept.
pub fn logout(ctx: &mut Context) {
    if !ctx.cart().session().is_authenticated() {
        println!("Not signed in.");
        return;
    }
    ctx.cart_mut().logout();
    println!("Signed out.");
}

/// Print the signed-in account as the service sees it.
///
/// # Errors
///
/// Returns `CliError::NotSignedIn` without a session.
pub async fn whoami(ctx: &Context) -> Result<(), CliError> {
    if !ctx.cart().session().is_authenticated() {
        return Err(CliError::NotSignedIn);
    }
    let user = ctx.cart().remote().me().await?;
    match user.display_name {
        Some(name) => println!("{name} <{}>", user.email),
        None => println!("{}", user.email),
    }
    Ok(())
}

/// Print a reconciliation outcome.
pub fn print_report(report: &ReconcileReport) {
    if report.aborted {
        println!("Sync stopped: the session changed or expired. Sign in again.");
        return;
    }
    println!(
        "Synced: {} uploaded, {} downloaded, {} already matched.",
        report.pushed.len(),
        report.pulled.len(),
        report.linked.len()
    );
    for (product_id, error) in &report.failed {
        println!("  {product_id}: {error}");
    }
    for product_id in &report.skipped {
        println!("  {product_id}: no longer in the catalog, skipped");
    }
}
