//! Set difference between a local and a remote cart.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// Presence comparison of two carts by product id.
///
/// Derived and never persisted: recompute it whenever either cart changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
    /// Ids only the local cart holds.
    pub local_only: BTreeSet<ProductId>,
    /// Ids only the remote cart holds.
    pub remote_only: BTreeSet<ProductId>,
    /// Ids held by both sides.
    pub common: BTreeSet<ProductId>,
    /// True iff the carts differ in presence.
    pub needs_sync: bool,
}

impl ReconciliationResult {
    /// Compare two collections of product ids.
    ///
    /// Duplicates on either side collapse; order is irrelevant.
    pub fn compare<'a, L, R>(local: L, remote: R) -> Self
    where
        L: IntoIterator<Item = &'a ProductId>,
        R: IntoIterator<Item = &'a ProductId>,
    {
        let local: BTreeSet<ProductId> = local.into_iter().cloned().collect();
        let remote: BTreeSet<ProductId> = remote.into_iter().cloned().collect();

        let local_only: BTreeSet<_> = local.difference(&remote).cloned().collect();
        let remote_only: BTreeSet<_> = remote.difference(&local).cloned().collect();
        let common: BTreeSet<_> = local.intersection(&remote).cloned().collect();
        let needs_sync = !local_only.is_empty() || !remote_only.is_empty();

        Self {
            local_only,
            remote_only,
            common,
            needs_sync,
        }
    }
}
