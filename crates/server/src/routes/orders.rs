//! Order route handlers.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use cartsync_core::{CheckoutRequest, OrderConfirmation};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::state::AppState;

/// Orders placed by the signed-in account.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Json<Vec<OrderConfirmation>> {
    Json(OrderRepository::new(state.db()).list(&user.id).await)
}

/// Place an order from the cart and empty it.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn place(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderConfirmation>)> {
    let shipping_address = body.shipping_address.trim();
    if shipping_address.is_empty() {
        return Err(AppError::BadRequest(
            "shipping address is required".to_string(),
        ));
    }

    let order = OrderRepository::new(state.db())
        .place_from_cart(&user.id, state.catalog(), shipping_address)
        .await
        .ok_or(AppError::EmptyCart)?;

    tracing::info!(
        order_id = %order.order_id,
        items = order.items.len(),
        total = %order.total,
        "Order placed"
    );
    Ok((StatusCode::CREATED, Json(order)))
}
