//! Bearer token authentication extractor.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};

use crate::db::UserRepository;
use crate::error::{AppError, set_sentry_user};
use crate::models::User;
use crate::services::TokenError;
use crate::state::AppState;

/// Extractor that requires a valid `Authorization: Bearer <token>` header.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireUser(pub User);

/// Why a request was not authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    /// No bearer token was sent.
    MissingToken,
    /// The token failed verification.
    InvalidToken(TokenError),
    /// The token names an account that no longer exists.
    UnknownUser,
}

impl From<AuthRejection> for AppError {
    fn from(rejection: AuthRejection) -> Self {
        let message = match rejection {
            AuthRejection::MissingToken => "Sign in required",
            AuthRejection::InvalidToken(TokenError::Expired) => "Session expired, sign in again",
            AuthRejection::InvalidToken(_) | AuthRejection::UnknownUser => "Invalid token",
        };
        Self::Unauthorized(message.to_string())
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .ok_or(AuthRejection::MissingToken)?;

        let claims = state
            .tokens()
            .verify(token)
            .map_err(AuthRejection::InvalidToken)?;

        let user = UserRepository::new(state.db())
            .get_by_id(&claims.user_id)
            .await
            .ok_or(AuthRejection::UnknownUser)?;

        set_sentry_user(&user.id, Some(user.email.as_str()));
        tracing::Span::current().record("user_id", user.id.as_str());

        Ok(Self(user))
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use cartsync_core::{ErrorBody, ErrorCode};
    use http_body_util::BodyExt;

    use super::*;

    async fn rejection_body(rejection: AuthRejection) -> (StatusCode, ErrorBody) {
        let response = rejection.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_rejections_use_unauthorized_error_body() {
        let cases = [
            (AuthRejection::MissingToken, "Sign in required"),
            (
                AuthRejection::InvalidToken(TokenError::Expired),
                "Session expired, sign in again",
            ),
            (AuthRejection::InvalidToken(TokenError::BadSignature), "Invalid token"),
            (AuthRejection::UnknownUser, "Invalid token"),
        ];

        for (rejection, message) in cases {
            let (status, body) = rejection_body(rejection).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, ErrorBody::new(ErrorCode::Unauthorized, message));
        }
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearer"), None);
    }
}
