//! Cartsync Core - Shared types library.
//!
//! This crate provides common types used across all Cartsync components:
//! - `client` - Local cart store, session, remote cart client and reconciler
//! - `server` - Reference remote cart service
//! - `cli` - Command-line front end for the client
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Ids, prices, cart lines, reconciliation sets and API bodies

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
