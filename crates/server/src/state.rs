//! Application state shared across handlers.

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::db::Database;
use crate::services::TokenService;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    tokens: TokenService,
    catalog: Catalog,
    db: Database,
}

impl AppState {
    /// Create a new application state with an empty database.
    #[must_use]
    pub fn new(tokens: TokenService, catalog: Catalog) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                tokens,
                catalog,
                db: Database::new(),
            }),
        }
    }

    /// Bearer token issuer and verifier.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// The product catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// The in-memory database.
    #[must_use]
    pub fn db(&self) -> &Database {
        &self.inner.db
    }
}
