//! Local/remote cart reconciliation.
//!
//! Runs once per sign-in (and on manual refresh) to bring both carts to the
//! same set of product ids:
//!
//! 1. List the remote cart. Failure aborts the run with the local cart untouched.
//! 2. Diff product ids into local-only, remote-only and common.
//! 3. Link common ids to their remote line. Local content is never overwritten.
//! 4. Push local-only ids concurrently, attaching each remote id as it arrives.
//!    `AlreadyPresent` counts as success once a fresh listing supplies the
//!    remote id; other failures are recorded and the batch carries on.
//! 5. Pull remote-only ids into the local cart, fetching product detail
//!    concurrently when the listing lacks it. Lines land in listing order;
//!    lines without detail are skipped.
//!
//! Every local side effect is gated on the [`SessionGuard`] taken at the start,
//! so a run that outlives its session writes nothing.
//!
//! Reruns converge: ids linked or pushed last time show up as common.

use std::collections::HashMap;

use cartsync_core::{ProductId, ReconciliationResult, RemoteCartEntry, RemoteId};
use futures::{StreamExt, stream};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::local::LocalCart;
use crate::remote::{RemoteCart, RemoteError};
use crate::session::{Session, SessionGuard};
use crate::storage::KeyValueStore;

/// Default number of remote calls in flight during a run.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// Why a run did not start.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// No signed-in session; nothing was sent.
    #[error("not signed in")]
    Unauthenticated,

    /// Listing the remote cart failed; the local cart is untouched.
    #[error("failed to list remote cart: {0}")]
    List(#[source] RemoteError),
}

/// Outcome of one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Local-only ids added to the remote cart.
    pub pushed: Vec<ProductId>,
    /// Remote-only ids added to the local cart.
    pub pulled: Vec<ProductId>,
    /// Ids present on both sides whose remote id was attached locally.
    pub linked: Vec<ProductId>,
    /// Ids whose remote call failed.
    pub failed: Vec<(ProductId, RemoteError)>,
    /// Ids left unmatched: remote-only lines without product detail, and
    /// `AlreadyPresent` pushes whose remote line could not be found.
    pub skipped: Vec<ProductId>,
    /// The session changed or was rejected mid-run.
    pub aborted: bool,
}

impl ReconcileReport {
    /// True when every id was handled and the run finished.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.aborted && self.failed.is_empty() && self.skipped.is_empty()
    }

    fn abort() -> Self {
        Self {
            aborted: true,
            ..Self::default()
        }
    }
}

/// Merges a [`LocalCart`] with a [`RemoteCart`].
#[derive(Debug, Clone, Copy)]
pub struct Reconciler {
    max_in_flight: usize,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl Reconciler {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    /// Cap concurrent remote calls (minimum 1).
    #[must_use]
    pub const fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = if max_in_flight == 0 { 1 } else { max_in_flight };
        self
    }

    /// Diff the local cart against a remote listing.
    #[must_use]
    pub fn compare<S: KeyValueStore>(
        local: &LocalCart<S>,
        remote: &[RemoteCartEntry],
    ) -> ReconciliationResult {
        ReconciliationResult::compare(local.product_ids(), remote.iter().map(|e| &e.product_id))
    }

    /// Run one reconciliation pass.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Unauthenticated`] without any remote call if
    /// nobody is signed in, and [`ReconcileError::List`] if the remote cart
    /// cannot be listed. Per-item failures land in the report instead.
    #[instrument(skip_all)]
    pub async fn run<S, A, R>(
        &self,
        local: &mut LocalCart<S>,
        remote: &R,
        session: &Session<A>,
    ) -> Result<ReconcileReport, ReconcileError>
    where
        S: KeyValueStore,
        R: RemoteCart,
    {
        if !session.is_authenticated() {
            return Err(ReconcileError::Unauthenticated);
        }
        let guard = session.guard();

        let listing = remote.list().await.map_err(|e| {
            warn!(error = %e, "Reconciliation aborted: could not list remote cart");
            ReconcileError::List(e)
        })?;
        if !session.is_current(&guard) {
            info!("Session changed while listing remote cart; discarding result");
            return Ok(ReconcileReport::abort());
        }

        let diff = Self::compare(local, &listing);
        debug!(
            local_only = diff.local_only.len(),
            remote_only = diff.remote_only.len(),
            common = diff.common.len(),
            "Computed cart difference"
        );

        let mut report = ReconcileReport::default();
        let by_id: HashMap<&ProductId, &RemoteCartEntry> =
            listing.iter().map(|e| (&e.product_id, e)).collect();

        for product_id in &diff.common {
            if let Some(entry) = by_id.get(product_id) {
                link(local, product_id, &entry.remote_id, &mut report);
            }
        }

        self.push(local, remote, session, &guard, &diff, &mut report)
            .await;
        if report.aborted {
            return Ok(report);
        }

        let pulls: Vec<&RemoteCartEntry> = listing
            .iter()
            .filter(|entry| diff.remote_only.contains(&entry.product_id))
            .collect();
        self.pull(local, remote, session, &guard, pulls, &mut report)
            .await;

        info!(
            pushed = report.pushed.len(),
            pulled = report.pulled.len(),
            linked = report.linked.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            aborted = report.aborted,
            "Reconciliation finished"
        );
        Ok(report)
    }

    /// Step 4: mirror local-only ids to the remote cart.
    async fn push<S, A, R>(
        &self,
        local: &mut LocalCart<S>,
        remote: &R,
        session: &Session<A>,
        guard: &SessionGuard,
        diff: &ReconciliationResult,
        report: &mut ReconcileReport,
    ) where
        S: KeyValueStore,
        R: RemoteCart,
    {
        let mut already_present = Vec::new();
        let mut completions = stream::iter(diff.local_only.iter())
            .map(|product_id| async move { (product_id, remote.add(product_id).await) })
            .buffer_unordered(self.max_in_flight);

        while let Some((product_id, result)) = completions.next().await {
            if !session.is_current(guard) {
                info!("Session changed during push; stopping reconciliation");
                report.aborted = true;
                return;
            }

            match result {
                Ok(remote_id) => {
                    if local.set_remote_id(product_id, remote_id) {
                        report.pushed.push(product_id.clone());
                    }
                }
                Err(RemoteError::AlreadyPresent) => {
                    debug!(product_id = %product_id, "Already in remote cart");
                    already_present.push(product_id.clone());
                }
                Err(RemoteError::Unauthorized) => {
                    warn!("Remote rejected the session during push; stopping reconciliation");
                    report.aborted = true;
                    return;
                }
                Err(e) => {
                    warn!(product_id = %product_id, error = %e, "Failed to mirror cart item");
                    report.failed.push((product_id.clone(), e));
                }
            }
        }
        if already_present.is_empty() {
            return;
        }

        // The listing predates these lines; fetch it again for their ids.
        match remote.list().await {
            Ok(fresh) if session.is_current(guard) => {
                for product_id in already_present {
                    match fresh.iter().find(|e| e.product_id == product_id) {
                        Some(entry) => link(local, &product_id, &entry.remote_id, report),
                        None => {
                            warn!(product_id = %product_id, "Remote reported line as present but did not list it");
                            report.skipped.push(product_id);
                        }
                    }
                }
            }
            Ok(_) => report.aborted = true,
            Err(e) => {
                debug!(error = %e, "Could not relist remote cart; lines stay unlinked until next run");
                report.skipped.extend(already_present);
            }
        }
    }

    /// Step 5: bring remote-only lines into the local cart.
    ///
    /// Detail fetches complete in any order; lines are applied afterwards in
    /// `entries` order.
    async fn pull<S, A, R>(
        &self,
        local: &mut LocalCart<S>,
        remote: &R,
        session: &Session<A>,
        guard: &SessionGuard,
        entries: Vec<&RemoteCartEntry>,
        report: &mut ReconcileReport,
    ) where
        S: KeyValueStore,
        R: RemoteCart,
    {
        let mut completions = stream::iter(entries.into_iter().enumerate())
            .map(|(position, entry)| async move {
                let filled = match entry.product {
                    Some(_) => Ok(entry.clone()),
                    None => remote
                        .product(&entry.product_id)
                        .await
                        .map(|product| RemoteCartEntry {
                            product,
                            ..entry.clone()
                        }),
                };
                (position, entry, filled)
            })
            .buffer_unordered(self.max_in_flight);

        let mut ready = Vec::new();
        while let Some((position, entry, filled)) = completions.next().await {
            if !session.is_current(guard) {
                info!("Session changed during pull; stopping reconciliation");
                report.aborted = true;
                return;
            }

            match filled {
                Ok(filled) => ready.push((position, filled)),
                Err(e) => {
                    warn!(product_id = %entry.product_id, error = %e, "Failed to fetch product detail");
                    report.failed.push((entry.product_id.clone(), e));
                }
            }
        }

        ready.sort_unstable_by_key(|(position, _)| *position);
        for (_, entry) in ready {
            if entry.product.is_none() {
                warn!(product_id = %entry.product_id, "No product detail for remote cart line; skipping");
                report.skipped.push(entry.product_id);
            } else if local.merge_remote(&entry) {
                report.pulled.push(entry.product_id);
            }
        }
    }
}

/// Attach `remote_id` unless the local line already carries it.
fn link<S: KeyValueStore>(
    local: &mut LocalCart<S>,
    product_id: &ProductId,
    remote_id: &RemoteId,
    report: &mut ReconcileReport,
) {
    let current = local.find(product_id).and_then(|item| item.remote_id.as_ref());
    if current == Some(remote_id) {
        return;
    }
    if local.set_remote_id(product_id, remote_id.clone()) {
        report.linked.push(product_id.clone());
    }
}
