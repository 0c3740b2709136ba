//! REST client for the booking backend.
//!
//! Every request carries `Content-Type: application/json`; the bearer token
//! is read from persisted storage through the [`SessionContext`] right
//! before sending and attached when present.
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx responses become [`ApiError::Status`] with the envelope `error`
//! message. A 401 on an authenticated endpoint additionally clears the
//! session, since the stored token is known to be dead. A 401 from
//! `auth/login` or `auth/register` only means bad credentials and leaves the
//! session alone. No other status has side effects here; navigation on
//! failure is the caller's decision (see [`crate::router::redirect_for`]).
//!
//! CANCELLATION
//! ============
//! Each request races the session epoch. Clearing the session (logout or a
//! 401 elsewhere) resolves any request still in flight to
//! [`ApiError::Cancelled`], so late responses never touch a newer session.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::Arc;

use reqwest::{Method, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::{ApiError, FailureKind};
use super::transport::{HttpTransport, PreparedRequest, RawResponse, Transport};
use super::types::{
    AnalyticsQuery, AuthPayload, Booking, BookingQuery, CancelResult, Cinema, CinemaQuery, Credentials, Envelope,
    HealthStatus, Movie, MovieDetails, MovieQuery, NewBooking, Page, PopularMovies, ProfileUpdate, Registration,
    Showtime, ShowtimeQuery, TopUp, TopUpResult, User,
};
use crate::config::ClientConfig;
use crate::state::session::SessionContext;

/// What a 401 response does to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnUnauthorized {
    ClearSession,
    Keep,
}

/// Typed client for the `/api` surface.
#[derive(Clone)]
pub struct ApiClient {
    base: Url,
    transport: Arc<dyn Transport>,
    session: SessionContext,
}

impl ApiClient {
    /// Build a client over the production reqwest transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or reqwest fails to build.
    pub fn new(config: &ClientConfig, session: SessionContext) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(config.timeouts)?;
        Self::with_transport(&config.base_url, session, Arc::new(transport))
    }

    /// Build a client over an arbitrary transport.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] if `base_url` cannot carry a path.
    pub fn with_transport(
        base_url: &str,
        session: SessionContext,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ApiError> {
        let base = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_owned()));
        }
        Ok(Self { base, transport, session })
    }

    #[must_use]
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    // =========================================================================
    // REQUEST PIPELINE
    // =========================================================================

    /// Send `method path` and return the parsed JSON body.
    ///
    /// `path` is relative to the base URL (`"/movies/42"`); `query` pairs are
    /// appended URL-encoded.
    ///
    /// # Errors
    ///
    /// See [`ApiError`]. A 401 also clears the session before returning.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        query: &[(String, String)],
    ) -> Result<Value, ApiError> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.execute(method, &segments, body, query, OnUnauthorized::ClearSession).await
    }

    /// Resolve URL and headers for a request without sending it.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] if the URL cannot be built.
    pub fn prepare(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<Value>,
        query: &[(String, String)],
    ) -> Result<PreparedRequest, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        let mut headers = vec![("Content-Type".to_owned(), "application/json".to_owned())];
        if let Some(token) = self.session.persisted_token() {
            headers.push(("Authorization".to_owned(), format!("Bearer {token}")));
        }

        Ok(PreparedRequest { method, url: url.into(), headers, body })
    }

    async fn execute(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<Value>,
        query: &[(String, String)],
        on_unauthorized: OnUnauthorized,
    ) -> Result<Value, ApiError> {
        let mut session_ended = self.session.subscribe();
        let request = self.prepare(method, segments, body, query)?;
        tracing::debug!(method = %request.method, url = %request.url, "api request");

        let response = tokio::select! {
            result = self.transport.send(&request) => result?,
            _ = session_ended.changed() => {
                tracing::debug!(method = %request.method, url = %request.url, "api request cancelled");
                return Err(ApiError::Cancelled);
            }
        };
        self.handle_response(response, on_unauthorized)
    }

    fn handle_response(&self, response: RawResponse, on_unauthorized: OnUnauthorized) -> Result<Value, ApiError> {
        if response.is_success() {
            if response.body.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()));
        }

        let err = ApiError::Status { status: response.status, message: error_message(&response.body) };
        if err.kind() == FailureKind::Unauthenticated && on_unauthorized == OnUnauthorized::ClearSession {
            tracing::warn!(status = response.status, "server rejected session token; clearing session");
            self.session.clear();
        } else {
            tracing::debug!(status = response.status, error = %err, "api request failed");
        }
        Err(err)
    }

    async fn get_json(&self, segments: &[&str], query: &[(String, String)]) -> Result<Value, ApiError> {
        self.execute(Method::GET, segments, None, query, OnUnauthorized::ClearSession).await
    }

    async fn send_json<B: Serialize>(&self, method: Method, segments: &[&str], body: &B) -> Result<Value, ApiError> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Encode(e.to_string()))?;
        self.execute(method, segments, Some(body), &[], OnUnauthorized::ClearSession).await
    }

    /// POST to an `auth/*` endpoint. A 401 here rejects the credentials, not
    /// the current session.
    async fn send_credentials<B: Serialize>(&self, action: &str, body: &B) -> Result<Value, ApiError> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Encode(e.to_string()))?;
        self.execute(Method::POST, &["auth", action], Some(body), &[], OnUnauthorized::Keep).await
    }

    // =========================================================================
    // AUTH + PROFILE
    // =========================================================================

    /// `POST /auth/register`.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn register(&self, registration: &Registration) -> Result<AuthPayload, ApiError> {
        decode_data(self.send_credentials("register", registration).await?)
    }

    /// `POST /auth/login`.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthPayload, ApiError> {
        decode_data(self.send_credentials("login", credentials).await?)
    }

    /// `GET /profile`.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn get_profile(&self) -> Result<User, ApiError> {
        decode_data(self.get_json(&["profile"], &[]).await?)
    }

    /// `PUT /profile`.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        decode_data(self.send_json(Method::PUT, &["profile"], update).await?)
    }

    // =========================================================================
    // CATALOG
    // =========================================================================

    /// `GET /movies`.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn get_movies(&self, query: &MovieQuery) -> Result<Page<Movie>, ApiError> {
        decode_page(self.get_json(&["movies"], &query_pairs(query)?).await?)
    }

    /// `GET /movies/:id`.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn get_movie_details(&self, id: &str) -> Result<MovieDetails, ApiError> {
        decode_data(self.get_json(&["movies", id], &[]).await?)
    }

    /// `GET /cinemas`.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn get_cinemas(&self, query: &CinemaQuery) -> Result<Page<Cinema>, ApiError> {
        decode_page(self.get_json(&["cinemas"], &query_pairs(query)?).await?)
    }

    /// `GET /showtimes`.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn get_showtimes(&self, query: &ShowtimeQuery) -> Result<Page<Showtime>, ApiError> {
        decode_page(self.get_json(&["showtimes"], &query_pairs(query)?).await?)
    }

    // =========================================================================
    // BOOKINGS + WALLET
    // =========================================================================

    /// `POST /bookings`.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn create_booking(&self, booking: &NewBooking) -> Result<Booking, ApiError> {
        decode_data(self.send_json(Method::POST, &["bookings"], booking).await?)
    }

    /// `GET /bookings/my`.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn get_my_bookings(&self, query: &BookingQuery) -> Result<Page<Booking>, ApiError> {
        decode_page(self.get_json(&["bookings", "my"], &query_pairs(query)?).await?)
    }

    /// `POST /bookings/:id/confirm`.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn confirm_booking(&self, id: &str) -> Result<Booking, ApiError> {
        let segments = ["bookings", id, "confirm"];
        decode_data(self.execute(Method::POST, &segments, None, &[], OnUnauthorized::ClearSession).await?)
    }

    /// `DELETE /bookings/:id`.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn cancel_booking(&self, id: &str) -> Result<CancelResult, ApiError> {
        let segments = ["bookings", id];
        decode_data(self.execute(Method::DELETE, &segments, None, &[], OnUnauthorized::ClearSession).await?)
    }

    /// `POST /wallet/topup`.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn top_up_wallet(&self, top_up: &TopUp) -> Result<TopUpResult, ApiError> {
        decode_data(self.send_json(Method::POST, &["wallet", "topup"], top_up).await?)
    }

    // =========================================================================
    // ANALYTICS + HEALTH
    // =========================================================================

    /// `GET /analytics/popular-movies`.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn get_popular_movies(&self, query: &AnalyticsQuery) -> Result<PopularMovies, ApiError> {
        decode_data(self.get_json(&["analytics", "popular-movies"], &query_pairs(query)?).await?)
    }

    /// `GET /health`. The body is not enveloped.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let value = self.get_json(&["health"], &[]).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

// =============================================================================
// PARSING
// =============================================================================

/// Flatten a query DTO into string pairs, skipping unset fields.
fn query_pairs<T: Serialize>(query: &T) -> Result<Vec<(String, String)>, ApiError> {
    let value = serde_json::to_value(query).map_err(|e| ApiError::Encode(e.to_string()))?;
    let Value::Object(map) = value else {
        return Ok(Vec::new());
    };
    Ok(map
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect())
}

fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value.get("error").and_then(Value::as_str).map(ToOwned::to_owned)
}

fn decode_data<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    let envelope: Envelope<T> = serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))?;
    envelope.data.ok_or_else(|| ApiError::Decode("response missing `data`".to_owned()))
}

fn decode_page<T: DeserializeOwned>(value: Value) -> Result<Page<T>, ApiError> {
    let envelope: Envelope<Vec<T>> = serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))?;
    Ok(Page { items: envelope.data.unwrap_or_default(), pagination: envelope.pagination })
}
