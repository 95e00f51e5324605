//! HTTP client for the cart service.
//!
//! Uses `reqwest` with bearer auth taken from the shared [`Session`].
//! Catalog lookups are cached using `moka` (5-minute TTL).

use std::sync::Arc;
use std::time::Duration;

use cartsync_core::{
    AddItemRequest, AddItemResponse, AuthResponse, CheckoutRequest, ErrorBody, ErrorCode,
    LoginRequest, OrderConfirmation, ProductDetail, ProductId, RegisterRequest, RemoteCartEntry,
    RemoteId, UserInfo,
};
use moka::future::Cache;
use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use super::{Checkout, RemoteCart, RemoteError};
use crate::config::ClientConfig;
use crate::session::{Session, SessionGuard};
use crate::storage::KeyValueStore;

/// Remote cart backed by the cart service's REST API.
///
/// Cheaply cloneable; clones share the HTTP connection pool, the product
/// cache and the session.
pub struct HttpRemoteCart<S> {
    inner: Arc<HttpRemoteCartInner<S>>,
}

struct HttpRemoteCartInner<S> {
    client: reqwest::Client,
    base_url: Url,
    session: Session<S>,
    products: Cache<ProductId, ProductDetail>,
}

impl<S> Clone for HttpRemoteCart<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> std::fmt::Debug for HttpRemoteCart<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRemoteCart")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl<S: KeyValueStore> HttpRemoteCart<S> {
    /// Create a client for the service at `config.api_url`.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Network` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, session: Session<S>) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let products = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(HttpRemoteCartInner {
                client,
                base_url: config.api_url.clone(),
                session,
                products,
            }),
        })
    }

    /// The session this client authenticates with.
    #[must_use]
    pub fn session(&self) -> &Session<S> {
        &self.inner.session
    }

    /// Build an endpoint URL from path segments, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::Decode(format!("{} cannot be a base URL", self.inner.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Attach the bearer token, or fail without a network round-trip.
    ///
    /// The returned guard names the session the token came from; a 401 on
    /// this request only invalidates that session.
    fn authorize(
        &self,
        request: RequestBuilder,
    ) -> Result<(RequestBuilder, SessionGuard), RemoteError> {
        let (token, guard) = self
            .inner
            .session
            .credentials()
            .ok_or(RemoteError::Unauthorized)?;
        Ok((request.bearer_auth(token.expose_secret()), guard))
    }

    /// Send a request and map non-success statuses to [`RemoteError`].
    async fn execute(
        &self,
        request: RequestBuilder,
        sent_as: Option<&SessionGuard>,
    ) -> Result<reqwest::Response, RemoteError> {
        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<ErrorBody>(&text).ok();
        let message = body
            .as_ref()
            .map_or_else(|| text.chars().take(200).collect(), |b| b.error.clone());

        Err(match status {
            StatusCode::UNAUTHORIZED => {
                if let Some(guard) = sent_as {
                    self.inner.session.invalidate_if_current(guard);
                }
                RemoteError::Unauthorized
            }
            StatusCode::FORBIDDEN => RemoteError::Forbidden,
            StatusCode::NOT_FOUND => RemoteError::NotFound(message),
            _ if body.as_ref().is_some_and(|b| b.code == ErrorCode::AlreadyPresent) => {
                RemoteError::AlreadyPresent
            }
            s if s.is_client_error() => RemoteError::Rejected {
                code: body.map_or(ErrorCode::BadRequest, |b| b.code),
                message,
            },
            s => {
                warn!(status = %s, body = %message, "Cart service returned non-success status");
                RemoteError::Server {
                    status: s.as_u16(),
                    message,
                }
            }
        })
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, RemoteError> {
        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Exchange credentials for a token. Does not touch the session.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Unauthorized` for bad credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<AuthResponse, RemoteError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.expose_secret().to_string(),
        };
        let request = self
            .inner
            .client
            .post(self.endpoint(&["api", "auth", "login"])?)
            .json(&body);
        Self::decode(self.execute(request, None).await?).await
    }

    /// Create an account and return a token for it.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Rejected` if the email is taken or the input is invalid.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        email: &str,
        password: &SecretString,
        display_name: Option<String>,
    ) -> Result<AuthResponse, RemoteError> {
        let body = RegisterRequest {
            email: email.to_string(),
            password: password.expose_secret().to_string(),
            display_name,
        };
        let request = self
            .inner
            .client
            .post(self.endpoint(&["api", "auth", "register"])?)
            .json(&body);
        Self::decode(self.execute(request, None).await?).await
    }

    /// Fetch the account behind the current token.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Unauthorized` if the token is missing or rejected.
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<UserInfo, RemoteError> {
        let (request, guard) = self.authorize(self.inner.client.get(self.endpoint(&["api", "auth", "me"])?))?;
        Self::decode(self.execute(request, Some(&guard)).await?).await
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// List the product catalog. Results seed the product cache.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if the request fails.
    #[instrument(skip(self))]
    pub async fn catalog(&self) -> Result<Vec<ProductDetail>, RemoteError> {
        let request = self.inner.client.get(self.endpoint(&["api", "products"])?);
        let products: Vec<ProductDetail> = Self::decode(self.execute(request, None).await?).await?;
        for product in &products {
            self.inner
                .products
                .insert(product.id.clone(), product.clone())
                .await;
        }
        Ok(products)
    }
}

impl<S: KeyValueStore> RemoteCart for HttpRemoteCart<S> {
    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<RemoteCartEntry>, RemoteError> {
        let (request, guard) = self.authorize(self.inner.client.get(self.endpoint(&["api", "cart"])?))?;
        let entries: Vec<RemoteCartEntry> = Self::decode(self.execute(request, Some(&guard)).await?).await?;
        debug!(count = entries.len(), "Listed remote cart");
        Ok(entries)
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn add(&self, product_id: &ProductId) -> Result<RemoteId, RemoteError> {
        let body = AddItemRequest {
            product_id: product_id.clone(),
        };
        let (request, guard) = self.authorize(
            self.inner
                .client
                .post(self.endpoint(&["api", "cart", "items"])?)
                .json(&body),
        )?;
        let added: AddItemResponse = Self::decode(self.execute(request, Some(&guard)).await?).await?;
        Ok(added.remote_id)
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn remove(&self, product_id: &ProductId) -> Result<(), RemoteError> {
        let (request, guard) = self.authorize(
            self.inner
                .client
                .delete(self.endpoint(&["api", "cart", "items", product_id.as_str()])?),
        )?;
        self.execute(request, Some(&guard)).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<(), RemoteError> {
        let (request, guard) = self.authorize(self.inner.client.delete(self.endpoint(&["api", "cart"])?))?;
        self.execute(request, Some(&guard)).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn product(&self, product_id: &ProductId) -> Result<Option<ProductDetail>, RemoteError> {
        if let Some(product) = self.inner.products.get(product_id).await {
            debug!("Product cache hit");
            return Ok(Some(product));
        }

        let request = self
            .inner
            .client
            .get(self.endpoint(&["api", "products", product_id.as_str()])?);
        match self.execute(request, None).await {
            Ok(response) => {
                let product: ProductDetail = Self::decode(response).await?;
                self.inner
                    .products
                    .insert(product_id.clone(), product.clone())
                    .await;
                Ok(Some(product))
            }
            Err(RemoteError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl<S: KeyValueStore> Checkout for HttpRemoteCart<S> {
    #[instrument(skip(self, shipping_address))]
    async fn place_order(&self, shipping_address: &str) -> Result<OrderConfirmation, RemoteError> {
        let body = CheckoutRequest {
            shipping_address: shipping_address.to_string(),
        };
        let (request, guard) = self.authorize(
            self.inner
                .client
                .post(self.endpoint(&["api", "orders"])?)
                .json(&body),
        )?;
        Self::decode(self.execute(request, Some(&guard)).await?).await
    }
}
