//! Remote cart store.
//!
//! The backend-held, per-user cart as the reconciler consumes it. Every call
//! crosses the network and fails independently.
//!
//! # Implementations
//!
//! - [`HttpRemoteCart`] - talks to the cart service over HTTP
//!
//! # Error mapping
//!
//! | Response | Error |
//! |---|---|
//! | 401 | [`RemoteError::Unauthorized`] (session invalidated) |
//! | 403 | [`RemoteError::Forbidden`] (session kept) |
//! | 409 `already_present` | [`RemoteError::AlreadyPresent`] |
//! | 404 | [`RemoteError::NotFound`] |
//! | other 4xx | [`RemoteError::Rejected`] |
//! | 5xx | [`RemoteError::Server`] |
//! | transport failure | [`RemoteError::Network`] |

mod http;
#[cfg(test)]
pub(crate) mod testing;

pub use http::HttpRemoteCart;

use std::future::Future;

use cartsync_core::{ErrorCode, OrderConfirmation, ProductDetail, ProductId, RemoteCartEntry, RemoteId};
use thiserror::Error;

/// Errors returned by remote cart operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// No valid session.
    #[error("not signed in or session expired")]
    Unauthorized,

    /// Signed in, but not allowed to do this.
    #[error("permission denied")]
    Forbidden,

    /// The product is already in the remote cart. An idempotency signal.
    #[error("product already in remote cart")]
    AlreadyPresent,

    /// The product or cart line does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request was rejected for another client-side reason.
    #[error("request rejected ({code:?}): {message}")]
    Rejected { code: ErrorCode, message: String },

    /// The server failed.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The request never got a response.
    #[error("network error: {0}")]
    Network(String),

    /// The response could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Whether a later attempt could succeed without user action.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Operations the reconciler needs from a remote cart.
pub trait RemoteCart {
    /// List every line of the signed-in user's cart.
    fn list(&self) -> impl Future<Output = Result<Vec<RemoteCartEntry>, RemoteError>> + Send;

    /// Add `product_id`, returning the id of the new remote line.
    ///
    /// Fails with [`RemoteError::AlreadyPresent`] if the product is already
    /// in the cart.
    fn add(
        &self,
        product_id: &ProductId,
    ) -> impl Future<Output = Result<RemoteId, RemoteError>> + Send;

    /// Remove the line for `product_id`; [`RemoteError::NotFound`] if absent.
    fn remove(&self, product_id: &ProductId) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Remove every line.
    fn clear(&self) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Fetch catalog detail for `product_id`, `None` if unknown.
    fn product(
        &self,
        product_id: &ProductId,
    ) -> impl Future<Output = Result<Option<ProductDetail>, RemoteError>> + Send;
}

/// Order placement from the remote cart.
pub trait Checkout {
    /// Turn the signed-in user's remote cart into an order.
    fn place_order(
        &self,
        shipping_address: &str,
    ) -> impl Future<Output = Result<OrderConfirmation, RemoteError>> + Send;
}
