//! Account route handlers.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use cartsync_core::{AuthResponse, LoginRequest, RegisterRequest, UserInfo};

use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::User;
use crate::services::AuthService;
use crate::state::AppState;

/// Create an account and sign it in.
#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let user = AuthService::new(state.db())
        .register_with_password(&body.email, &body.password, body.display_name)
        .await?;

    tracing::info!(user_id = %user.id, "Account registered");
    Ok((StatusCode::CREATED, Json(signed_in(&state, &user)?)))
}

/// Exchange email and password for a bearer token.
#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let user = AuthService::new(state.db())
        .login_with_password(&body.email, &body.password)
        .await
        .inspect_err(|e| tracing::info!(error = %e, "Login failed"))?;

    Ok(Json(signed_in(&state, &user)?))
}

/// The signed-in account.
pub async fn me(RequireUser(user): RequireUser) -> Json<UserInfo> {
    Json(user.info())
}

fn signed_in(state: &AppState, user: &User) -> Result<AuthResponse> {
    let (token, expires_at) = state.tokens().issue(&user.id)?;
    Ok(AuthResponse {
        token,
        expires_at,
        user: user.info(),
    })
}
