//! Auth actions for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Views call [`AuthStore`] to log in, register, log out, and refresh the
//! profile. Results are reported as display strings; the session itself
//! lives in [`SessionContext`] and is shared with the router and client.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use crate::net::api::ApiClient;
use crate::net::error::ApiError;
use crate::net::types::{Credentials, Registration, User};
use crate::state::session::SessionContext;
use crate::util::storage::StorageError;

const LOGIN_FAILED: &str = "Login failed";
const REGISTRATION_FAILED: &str = "Registration failed";

/// Login/register/logout/profile actions over a shared session.
#[derive(Clone)]
pub struct AuthStore {
    api: ApiClient,
}

impl AuthStore {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn session(&self) -> &SessionContext {
        self.api.session()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.session().user()
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.session().token()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    /// Authenticate and replace the session.
    ///
    /// # Errors
    ///
    /// Returns the server's message, or `"Login failed"`. The previous
    /// session is left as it was.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), String> {
        match self.api.login(credentials).await {
            Ok(payload) => {
                self.session()
                    .establish(payload.token, payload.user)
                    .map_err(|e| persist_failed(&e, LOGIN_FAILED))?;
                tracing::info!(email = %credentials.email, "logged in");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(email = %credentials.email, error = %e, "login failed");
                Err(message_or(&e, LOGIN_FAILED))
            }
        }
    }

    /// Create an account and sign in as it.
    ///
    /// # Errors
    ///
    /// Returns the server's message, or `"Registration failed"`.
    pub async fn register(&self, registration: &Registration) -> Result<(), String> {
        match self.api.register(registration).await {
            Ok(payload) => {
                self.session()
                    .establish(payload.token, payload.user)
                    .map_err(|e| persist_failed(&e, REGISTRATION_FAILED))?;
                tracing::info!(email = %registration.email, "registered");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(email = %registration.email, error = %e, "registration failed");
                Err(message_or(&e, REGISTRATION_FAILED))
            }
        }
    }

    /// Local sign-out. No request is sent.
    pub fn logout(&self) {
        self.session().clear();
        tracing::info!("logged out");
    }

    /// Refresh the user record from `GET /profile`.
    ///
    /// Failures are logged and leave the session unchanged. A profile that
    /// arrives after the session was cleared is dropped.
    pub async fn fetch_profile(&self) {
        let epoch = self.session().epoch();
        match self.api.get_profile().await {
            Ok(user) => {
                if self.session().epoch() != epoch || !self.session().is_authenticated() {
                    tracing::debug!("discarding profile for an ended session");
                    return;
                }
                if let Err(e) = self.session().replace_user(user) {
                    tracing::warn!(error = %e, "failed to persist refreshed profile");
                }
            }
            Err(ApiError::Cancelled) => tracing::debug!("profile refresh cancelled"),
            Err(e) => tracing::warn!(error = %e, "failed to fetch profile"),
        }
    }
}

fn message_or(error: &ApiError, fallback: &str) -> String {
    error.server_message().map_or_else(|| fallback.to_owned(), ToOwned::to_owned)
}

fn persist_failed(error: &StorageError, fallback: &str) -> String {
    tracing::warn!(error = %error, "failed to persist session");
    fallback.to_owned()
}
