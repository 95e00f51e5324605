//! Cartsync CLI - a local-first cart in the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog (also caches it for offline adds)
//! cartsync products
//!
//! # Guest cart, works without the server
//! cartsync cart add 2
//! cartsync cart list
//!
//! # Sign in; the guest cart is merged with the account cart
//! cartsync login -e ada@example.com -p 'correct horse'
//!
//! # Place an order
//! cartsync checkout --address "1 Main St"
//! ```
//!
//! # Commands
//!
//! - `products` - List the catalog
//! - `cart` - Show and edit the local cart
//! - `register` / `login` / `logout` / `whoami` - Account
//! - `sync` - Reconcile with the account cart
//! - `status` - Show what differs from the account cart
//! - `checkout` - Place an order
//!
//! Configuration comes from `CARTSYNC_*` environment variables (see
//! `cartsync_client::config`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use cartsync_core::ProductId;

mod commands;

use commands::{CliError, Context};

#[derive(Parser)]
#[command(name = "cartsync")]
#[command(author, version, about = "Cartsync cart client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the product catalog
    Products,
    /// Show and edit the local cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Create an account and sign in
    Register {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,

        /// Name shown in the cart
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Sign in and merge the local cart with the account cart
    Login {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },
    /// Sign out and empty the local cart
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Reconcile the local cart with the account cart
    Sync,
    /// Show which products differ from the account cart
    Status,
    /// Place an order from the cart
    Checkout {
        /// Shipping address
        #[arg(short, long)]
        address: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// List cart items
    List,
    /// Add a product by id
    Add { product_id: String },
    /// Remove a product by id
    Remove { product_id: String },
    /// Remove every item
    Clear,
    /// Item count and total
    Summary,
}

#[tokio::main]
async fn main() {
    // Quiet by default; RUST_LOG=cartsync_client=debug shows sync details
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut ctx = Context::open()?;

    match cli.command {
        Commands::Products => commands::catalog::list(&ctx).await?,
        Commands::Cart { action } => match action {
            CartAction::List => commands::cart::list(&ctx),
            CartAction::Add { product_id } => {
                commands::cart::add(&mut ctx, &ProductId::new(product_id)).await?;
            }
            CartAction::Remove { product_id } => {
                commands::cart::remove(&mut ctx, &ProductId::new(product_id)).await;
            }
            CartAction::Clear => commands::cart::clear(&mut ctx).await,
            CartAction::Summary => commands::cart::summary(&ctx),
        },
        Commands::Register {
            email,
            password,
            name,
        } => commands::account::register(&mut ctx, &email, password.into(), name).await?,
        Commands::Login { email, password } => {
            commands::account::login(&mut ctx, &email, password.into()).await?;
        }
        Commands::Logout => commands::account::logout(&mut ctx),
        Commands::Whoami => commands::account::whoami(&ctx).await?,
        Commands::Sync => commands::sync::sync(&mut ctx).await?,
        Commands::Status => commands::sync::status(&ctx).await?,
        Commands::Checkout { address } => commands::sync::checkout(&mut ctx, &address).await?,
    }
    Ok(())
}
