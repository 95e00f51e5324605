//! Domain types for the cart service.

pub mod user;

pub use user::User;
