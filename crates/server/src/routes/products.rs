//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use cartsync_core::{ProductDetail, ProductId};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Every product, in display order.
pub async fn index(State(state): State<AppState>) -> Json<Vec<ProductDetail>> {
    Json(state.catalog().all().to_vec())
}

/// One product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductDetail>> {
    state
        .catalog()
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id} not found")))
}
