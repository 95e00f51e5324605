//! Business logic services.
//!
//! - [`auth`] - Password registration and login
//! - [`token`] - Bearer token issuance and verification

pub mod auth;
pub mod token;

pub use auth::{AuthError, AuthService};
pub use token::{Claims, TokenError, TokenService};
