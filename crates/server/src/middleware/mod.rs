//! HTTP middleware stack for the cart service.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//!
//! Authentication is an extractor, [`RequireUser`], applied per handler.

pub mod auth;
pub mod request_id;

pub use auth::{AuthRejection, RequireUser};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
