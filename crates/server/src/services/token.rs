//! Bearer tokens.
//!
//! Format: `base64url(user_id:expires_at).hex(hmac_sha256(payload))`, where
//! `expires_at` is a Unix timestamp in seconds. Tokens are stateless; a
//! token stays valid until it expires.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

use cartsync_core::UserId;

type HmacSha256 = Hmac<Sha256>;

/// Token lifetime in seconds (2 hours).
pub const TOKEN_TTL_SECS: i64 = 2 * 60 * 60;

/// Errors verifying a token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid token signature")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("signing key rejected")]
    InvalidKey,
}

/// What a valid token says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    secret: SecretString,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl TokenService {
    #[must_use]
    pub const fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Issue a token for `user_id` valid for [`TOKEN_TTL_SECS`].
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidKey` if the HMAC cannot be keyed.
    pub fn issue(&self, user_id: &UserId) -> Result<(String, DateTime<Utc>), TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    fn issue_at(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), TokenError> {
        let expires_at = now + Duration::seconds(TOKEN_TTL_SECS);
        let payload = URL_SAFE_NO_PAD.encode(format!("{user_id}:{}", expires_at.timestamp()));
        let signature = hex::encode(self.sign(payload.as_bytes())?.finalize().into_bytes());
        Ok((format!("{payload}.{signature}"), expires_at))
    }

    /// Verify `token` and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` if the token is malformed, tampered with or expired.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let (payload, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let signature = hex::decode(signature).map_err(|_| TokenError::Malformed)?;

        // Constant-time comparison
        self.sign(payload.as_bytes())?
            .verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let decoded = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let decoded = String::from_utf8(decoded).map_err(|_| TokenError::Malformed)?;
        let (user_id, expires) = decoded.rsplit_once(':').ok_or(TokenError::Malformed)?;
        let expires_at = expires
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .ok_or(TokenError::Malformed)?;

        if user_id.is_empty() {
            return Err(TokenError::Malformed);
        }
        if expires_at <= now {
            return Err(TokenError::Expired);
        }

        Ok(Claims {
            user_id: UserId::new(user_id),
            expires_at,
        })
    }

    fn sign(&self, payload: &[u8]) -> Result<HmacSha256, TokenError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| TokenError::InvalidKey)?;
        mac.update(payload);
        Ok(mac)
    }
}
