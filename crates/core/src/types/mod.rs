//! Core types for Cartsync.
//!
//! This module provides type-safe wrappers for cart domain concepts.

pub mod api;
pub mod cart;
pub mod email;
pub mod id;
pub mod price;
pub mod reconcile;

pub use api::*;
pub use cart::{CartItem, CartSummary, ProductDetail, RemoteCartEntry};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price, PriceError};
pub use reconcile::ReconciliationResult;
