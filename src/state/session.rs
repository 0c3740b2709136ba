//! Shared auth-session context.
//!
//! ARCHITECTURE
//! ============
//! [`SessionContext`] is the single owner of the current token and user. It
//! is cloned into the router, the API client, and the auth store, all of
//! which see the same in-memory [`Session`] and the same injected
//! [`Storage`]. The persisted `token`/`user` entries are a cache that lets a
//! session survive restarts; the in-memory copy is authoritative while the
//! process runs.
//!
//! Every mutation writes storage first and memory second, so a failed write
//! never leaves the two disagreeing. Clearing the session bumps an epoch on a
//! `watch` channel; in-flight requests subscribe to it and abort when it
//! moves.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::watch;

use crate::net::types::User;
use crate::util::storage::{Storage, StorageError, load_json, save_json};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

/// Current identity. `token.is_some()` is the sole authentication signal.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    pub user: Option<User>,
    pub token: Option<String>,
}

impl Session {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

struct Inner {
    storage: Arc<dyn Storage>,
    session: RwLock<Session>,
    epoch: watch::Sender<u64>,
}

/// Cloneable handle to the process-wide session.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("authenticated", &self.is_authenticated())
            .field("epoch", &self.epoch())
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    /// Restore the session from `storage`.
    ///
    /// Unreadable entries degrade to "absent" rather than failing start-up.
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let token = storage.get_item(TOKEN_KEY).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to read persisted token");
            None
        });
        let user = load_json::<User>(storage.as_ref(), USER_KEY).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "discarding unreadable persisted user");
            None
        });
        let (epoch, _) = watch::channel(0);
        Self { inner: Arc::new(Inner { storage, session: RwLock::new(Session { user, token }), epoch }) }
    }

    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.inner.session.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.inner.session.read().unwrap_or_else(PoisonError::into_inner).token.clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.inner.session.read().unwrap_or_else(PoisonError::into_inner).user.clone()
    }

    /// In-memory authentication flag.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.session.read().unwrap_or_else(PoisonError::into_inner).is_authenticated()
    }

    /// Token as currently persisted, re-read from storage on every call.
    ///
    /// This is what the navigation guard and outbound requests consult, so an
    /// out-of-band storage change takes effect immediately.
    #[must_use]
    pub fn persisted_token(&self) -> Option<String> {
        self.inner.storage.get_item(TOKEN_KEY).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to read persisted token");
            None
        })
    }

    /// Replace the whole session after login or registration.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written; memory is left as it was.
    pub fn establish(&self, token: String, user: User) -> Result<(), StorageError> {
        self.inner.storage.set_item(TOKEN_KEY, &token)?;
        save_json(self.inner.storage.as_ref(), USER_KEY, &user)?;
        let mut session = self.inner.session.write().unwrap_or_else(PoisonError::into_inner);
        *session = Session { user: Some(user), token: Some(token) };
        Ok(())
    }

    /// Replace only the user record, keeping the token.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written; memory is left as it was.
    pub fn replace_user(&self, user: User) -> Result<(), StorageError> {
        save_json(self.inner.storage.as_ref(), USER_KEY, &user)?;
        self.inner.session.write().unwrap_or_else(PoisonError::into_inner).user = Some(user);
        Ok(())
    }

    /// Drop token and user from memory and storage, and cancel in-flight
    /// requests. Storage failures are logged; memory is always cleared.
    pub fn clear(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.inner.storage.remove_item(key) {
                tracing::warn!(error = %e, key, "failed to remove persisted session entry");
            }
        }
        *self.inner.session.write().unwrap_or_else(PoisonError::into_inner) = Session::default();
        self.inner.epoch.send_modify(|epoch| *epoch = epoch.wrapping_add(1));
    }

    /// Number of times the session has been cleared.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        *self.inner.epoch.borrow()
    }

    /// Receiver that observes the next [`Self::clear`].
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.epoch.subscribe()
    }
}
