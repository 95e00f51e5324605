//! Client-side authentication state.
//!
//! Holds the bearer token and the signed-in user, persisted under the
//! `auth_token` and `user` slots. Clones share state, so the HTTP client can
//! invalidate the session on a 401 while the reconciler holds another handle.
//!
//! Every login, logout or invalidation bumps an epoch. Work that started
//! under one session takes a [`SessionGuard`] and checks it before applying
//! side effects, so a late response never writes into a cart that belongs to
//! a different (or no) user.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cartsync_core::{UserId, UserInfo};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::storage::KeyValueStore;

/// Storage key for the bearer token.
pub const TOKEN_KEY: &str = "auth_token";
/// Storage key for the serialized [`UserInfo`].
pub const USER_KEY: &str = "user";

/// Shared handle to the authentication state.
#[derive(Clone)]
pub struct Session<S> {
    store: S,
    state: Arc<Mutex<SessionState>>,
}

#[derive(Default)]
struct SessionState {
    token: Option<SecretString>,
    user: Option<UserInfo>,
    epoch: u64,
}

impl<S> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("Session")
            .field("token", &state.token.as_ref().map(|_| "[REDACTED]"))
            .field("user", &state.user)
            .field("epoch", &state.epoch)
            .finish_non_exhaustive()
    }
}

/// Snapshot of which session a piece of work started under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGuard {
    epoch: u64,
    user_id: Option<UserId>,
}

impl SessionGuard {
    /// The user the guarded work runs for.
    #[must_use]
    pub const fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }
}

impl<S: KeyValueStore> Session<S> {
    /// Restore persisted auth state from `store`.
    ///
    /// A missing or unreadable slot yields a signed-out session; a token
    /// without a user (or the reverse) is treated as signed out too.
    pub fn restore(store: S) -> Self {
        let token = store
            .read(TOKEN_KEY)
            .unwrap_or_else(|e| {
                warn!(error = %e, "Auth token unreadable");
                None
            })
            .filter(|token| !token.is_empty())
            .map(SecretString::from);

        let user = store
            .read(USER_KEY)
            .unwrap_or_else(|e| {
                warn!(error = %e, "Stored user unreadable");
                None
            })
            .and_then(|raw| match serde_json::from_str::<UserInfo>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(error = %e, "Stored user is corrupted");
                    None
                }
            });

        let state = match (token, user) {
            (Some(token), Some(user)) => SessionState {
                token: Some(token),
                user: Some(user),
                epoch: 0,
            },
            _ => SessionState::default(),
        };

        Self {
            store,
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Record a successful sign-in and persist it.
    pub fn login(&self, token: SecretString, user: UserInfo) {
        let mut state = self.lock();
        if let Err(e) = self.store.write(TOKEN_KEY, token.expose_secret()) {
            warn!(error = %e, "Failed to persist auth token");
        }
        match serde_json::to_string(&user) {
            Ok(json) => {
                if let Err(e) = self.store.write(USER_KEY, &json) {
                    warn!(error = %e, "Failed to persist user");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize user"),
        }

        info!(user_id = %user.id, "Signed in");
        state.token = Some(token);
        state.user = Some(user);
        state.epoch += 1;
    }

    /// Sign out and forget the persisted auth state.
    pub fn logout(&self) {
        self.forget(&mut self.lock());
        info!("Signed out");
    }

    /// Drop auth state after the server rejected the token.
    pub fn invalidate(&self) {
        self.forget(&mut self.lock());
        warn!("Session expired or was rejected; please sign in again");
    }

    /// Invalidate only if `guard` still names the current session.
    ///
    /// Returns whether the session was dropped. A rejection that arrives
    /// after a later login belongs to the old token and is ignored.
    pub fn invalidate_if_current(&self, guard: &SessionGuard) -> bool {
        let mut state = self.lock();
        if !Self::matches(&state, guard) {
            debug!("Ignoring rejection of a token from an earlier session");
            return false;
        }
        self.forget(&mut state);
        drop(state);
        warn!("Session expired or was rejected; please sign in again");
        true
    }

    /// Runs under the state lock so storage and memory change together.
    fn forget(&self, state: &mut SessionState) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.store.remove(key) {
                warn!(error = %e, key, "Failed to clear auth state");
            }
        }
        state.token = None;
        state.user = None;
        state.epoch += 1;
    }
}

impl<S> Session<S> {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The bearer token, if signed in.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.lock().token.clone()
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<UserInfo> {
        self.lock().user.clone()
    }

    /// True when both a token and a user are present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        let state = self.lock();
        state.token.is_some() && state.user.is_some()
    }

    /// Snapshot the current session identity.
    #[must_use]
    pub fn guard(&self) -> SessionGuard {
        Self::guard_of(&self.lock())
    }

    /// The bearer token together with the session it belongs to, read
    /// atomically so the pair cannot straddle a login or logout.
    #[must_use]
    pub fn credentials(&self) -> Option<(SecretString, SessionGuard)> {
        let state = self.lock();
        let token = state.token.clone()?;
        Some((token, Self::guard_of(&state)))
    }

    fn guard_of(state: &SessionState) -> SessionGuard {
        SessionGuard {
            epoch: state.epoch,
            user_id: state.user.as_ref().map(|user| user.id.clone()),
        }
    }

    /// True if no login, logout or invalidation happened since `guard` was
    /// taken and the same user is still signed in.
    #[must_use]
    pub fn is_current(&self, guard: &SessionGuard) -> bool {
        Self::matches(&self.lock(), guard)
    }

    fn matches(state: &SessionState, guard: &SessionGuard) -> bool {
        state.epoch == guard.epoch
            && guard.user_id.is_some()
            && state.user.as_ref().map(|user| &user.id) == guard.user_id.as_ref()
    }
}
