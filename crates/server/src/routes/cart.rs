//! Remote cart route handlers.
//!
//! One cart per account, at most one line per product. Lines are joined
//! with the catalog on read; a line whose product has left the catalog is
//! listed without detail.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use cartsync_core::{AddItemRequest, AddItemResponse, ProductId, RemoteCartEntry};

use crate::db::{CartRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::state::AppState;

/// List the cart.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Json<Vec<RemoteCartEntry>> {
    let entries = CartRepository::new(state.db())
        .list(&user.id)
        .await
        .into_iter()
        .map(|line| RemoteCartEntry {
            product: state.catalog().get(&line.product_id).cloned(),
            remote_id: line.remote_id,
            product_id: line.product_id,
            added_at: line.added_at,
        })
        .collect();
    Json(entries)
}

/// Add a product.
#[instrument(skip(state, user, body), fields(user_id = %user.id, product_id = %body.product_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<AddItemResponse>)> {
    if state.catalog().get(&body.product_id).is_none() {
        return Err(AppError::NotFound(format!(
            "product {} not found",
            body.product_id
        )));
    }

    let line = CartRepository::new(state.db())
        .add(&user.id, &body.product_id)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(msg) => AppError::AlreadyPresent(msg),
            RepositoryError::NotFound(msg) => AppError::NotFound(msg),
        })?;

    tracing::debug!(remote_id = %line.remote_id, "Cart line added");
    Ok((
        StatusCode::CREATED,
        Json(AddItemResponse {
            remote_id: line.remote_id,
            product_id: line.product_id,
        }),
    ))
}

/// Remove a product.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(product_id): Path<ProductId>,
) -> Result<StatusCode> {
    CartRepository::new(state.db())
        .remove(&user.id, &product_id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound(msg) | RepositoryError::Conflict(msg) => {
                AppError::NotFound(msg)
            }
        })?;
    Ok(StatusCode::NO_CONTENT)
}

/// Empty the cart.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn clear(State(state): State<AppState>, RequireUser(user): RequireUser) -> StatusCode {
    CartRepository::new(state.db()).clear(&user.id).await;
    StatusCode::NO_CONTENT
}
