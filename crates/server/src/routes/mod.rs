//! HTTP route handlers for the cart service.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST   /api/auth/register          - Create account, returns a bearer token
//! POST   /api/auth/login             - Verify password, returns a bearer token
//! GET    /api/auth/me                - Current user (auth)
//!
//! # Catalog
//! GET    /api/products               - Product listing
//! GET    /api/products/{id}          - Product detail
//!
//! # Cart (auth)
//! GET    /api/cart                   - Cart entries with product detail
//! DELETE /api/cart                   - Clear the cart
//! POST   /api/cart/items             - Add a product
//! DELETE /api/cart/items/{productId} - Remove a product
//!
//! # Orders (auth)
//! GET    /api/orders                 - Order history
//! POST   /api/orders                 - Place an order from the cart
//! ```

pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route("/items/{product_id}", delete(cart::remove))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new().route("/", get(orders::index).post(orders::place))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth_routes())
        .nest("/api/products", product_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/orders", order_routes())
}
