//! Wire DTOs for the booking REST API.
//!
//! DESIGN
//! ======
//! Every backend response is wrapped in an [`Envelope`]; payloads use
//! camelCase keys. Structs default missing fields so older or partial server
//! payloads still decode. Timestamps stay as ISO-8601 strings and are
//! rendered by `util::format`.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit JSON `null` like a missing field. The backend encodes
/// empty lists as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// =============================================================================
// ENVELOPE
// =============================================================================

/// Standard response wrapper: `{ success, data, error, message, pagination }`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub message: Option<String>,
    pub pagination: Option<Pagination>,
}

/// Pagination block attached to list responses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

/// One page of a list endpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Option<Pagination>,
}

/// `GET /health` body. Not enveloped.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthStatus {
    pub status: String,
    pub message: String,
}

// =============================================================================
// ACCOUNT
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Wallet {
    pub balance: f64,
    pub currency: String,
}

/// Authenticated user profile. Persisted verbatim under the `user` key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub phone: String,
    /// `"user"`, `"admin"`, or `"cinema_manager"`.
    pub role: String,
    pub wallet: Wallet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// `data` of `/auth/login` and `/auth/register`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopUp {
    pub amount: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopUpResult {
    pub wallet: Wallet,
    pub amount: f64,
}

// =============================================================================
// CATALOG
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Review {
    pub user_id: String,
    /// 1-10.
    pub rating: f64,
    pub comment: String,
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Movie {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    pub title_kz: String,
    pub title_ru: String,
    pub description: String,
    pub director: String,
    #[serde(deserialize_with = "null_as_default")]
    pub cast: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub genres: Vec<String>,
    /// Running time in minutes.
    pub duration: u32,
    pub release_date: Option<String>,
    /// MPAA-style rating (`"PG-13"`).
    pub rating: String,
    pub imdb_rating: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub language: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub subtitles: Vec<String>,
    pub poster_url: Option<String>,
    pub is_active: bool,
    pub age_restriction: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub reviews: Vec<Review>,
    pub created_at: Option<String>,
}

/// `data` of `GET /movies/:id`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MovieDetails {
    pub movie: Movie,
    pub average_review_rating: f64,
    pub total_reviews: u32,
    pub upcoming_showtimes: Option<u32>,
}

/// GeoJSON point, `[longitude, latitude]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub coordinates: Vec<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cinema {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub city: String,
    pub address: String,
    pub location: GeoPoint,
    #[serde(deserialize_with = "null_as_default")]
    pub facilities: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub hall_ids: Vec<String>,
    pub rating: f64,
    pub total_reviews: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub images: Vec<String>,
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookedSeat {
    pub row: String,
    pub number: u32,
    /// `"available"`, `"booked"`, or `"reserved"`.
    pub status: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Showtime {
    #[serde(alias = "_id")]
    pub id: String,
    pub movie_id: String,
    pub cinema_id: String,
    pub hall_id: String,
    pub start_time: String,
    pub end_time: String,
    pub base_price: f64,
    /// `"2D"`, `"3D"`, `"IMAX"`.
    pub format: String,
    pub language: String,
    pub subtitles: String,
    pub available_seats: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub booked_seats: Vec<BookedSeat>,
    pub created_at: Option<String>,
    /// Present when listed with `includeDetails=true`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movie_details: Option<Movie>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cinema_details: Option<Cinema>,
}

// =============================================================================
// BOOKINGS
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatRequest {
    pub row: String,
    pub number: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub showtime_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub seats: Vec<SeatRequest>,
    /// `"wallet"`, `"card"`, or `"cash"`.
    pub payment_method: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingSeat {
    pub row: String,
    pub number: u32,
    pub price: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Payment {
    pub method: String,
    pub transaction_id: String,
    pub paid_at: Option<String>,
    pub status: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Booking {
    #[serde(alias = "_id")]
    pub id: String,
    /// Human-facing reference, e.g. `"BK-20260201-001234"`.
    pub booking_number: String,
    pub user_id: String,
    pub showtime_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub seats: Vec<BookingSeat>,
    pub total_amount: f64,
    /// `"pending"`, `"confirmed"`, `"cancelled"`, or `"expired"`.
    pub status: String,
    pub payment: Payment,
    pub qr_code: String,
    pub expires_at: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// `data` of `DELETE /bookings/:id`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CancelResult {
    pub booking_id: String,
    pub cancelled: bool,
}

// =============================================================================
// ANALYTICS
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PopularMovie {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: String,
    pub title_kz: String,
    pub title_ru: String,
    #[serde(deserialize_with = "null_as_default")]
    pub genres: Vec<String>,
    pub imdb_rating: f64,
    pub total_bookings: u64,
    pub total_tickets: u64,
    pub total_revenue: f64,
    pub average_ticket_price: f64,
    pub popularity_score: f64,
}

/// `data` of `GET /analytics/popular-movies`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PopularMovies {
    #[serde(deserialize_with = "null_as_default")]
    pub movies: Vec<PopularMovie>,
    /// e.g. `"Last 30 days"`.
    pub period: String,
    pub total_movies: u32,
}

// =============================================================================
// QUERIES
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CinemaQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    /// Metres.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowtimeQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movie_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cinema_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hall_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_details: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BookingQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AnalyticsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
}
