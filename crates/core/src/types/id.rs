//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing a product id with a remote cart line id, even though
//! both travel as plain strings on the wire.

/// Macro to define a type-safe, opaque string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use cartsync_core::define_id;
/// define_id!(SkuId);
/// define_id!(LineId);
///
/// let sku = SkuId::new("p1");
/// let line = LineId::new("p1");
///
/// // These are different types, so this won't compile:
/// // let _: SkuId = line;
/// assert_eq!(sku.as_str(), line.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from anything string-like.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Catalog product identifier. Unique within a cart.
define_id!(ProductId);
// Identifier the remote store assigns to a mirrored cart line.
define_id!(RemoteId);
define_id!(UserId);
define_id!(OrderId);

impl RemoteId {
    /// Mint a fresh random remote id (UUID v4).
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl OrderId {
    /// Mint a fresh random order id (UUID v4).
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_transparent() {
        let id = ProductId::new("p1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"p1\"");

        let parsed: ProductId = serde_json::from_str("\"p1\"").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_display_and_conversions() {
        let id = UserId::from("user-7");
        assert_eq!(id.to_string(), "user-7");
        assert_eq!(String::from(id.clone()), "user-7");
        assert_eq!(id.as_ref(), "user-7");
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(RemoteId::generate(), RemoteId::generate());
        assert_ne!(OrderId::generate(), OrderId::generate());
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let mut ids = vec![ProductId::new("b"), ProductId::new("a"), ProductId::new("c")];
        ids.sort();
        assert_eq!(ids, vec![ProductId::new("a"), ProductId::new("b"), ProductId::new("c")]);
    }
}
