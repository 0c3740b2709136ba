use super::*;
use crate::net::mock::{MockTransport, TEST_BASE_URL, client_with, envelope, failure, user_json};
use crate::state::session::{TOKEN_KEY, USER_KEY};
use crate::util::storage::Storage;

// =============================================================================
// prepare: headers and URLs
// =============================================================================

#[test]
fn prepare_without_token_sets_only_content_type() {
    let transport = MockTransport::new();
    let (_, _, client) = client_with(&transport);

    let req = client.prepare(Method::GET, &["movies"], None, &[]).unwrap();
    assert_eq!(req.header("content-type"), Some("application/json"));
    assert_eq!(req.header("authorization"), None);
}

#[test]
fn prepare_attaches_persisted_bearer_token() {
    let transport = MockTransport::new();
    let (storage, _, client) = client_with(&transport);
    storage.set_item(TOKEN_KEY, "jwt-abc").unwrap();

    let req = client.prepare(Method::GET, &["profile"], None, &[]).unwrap();
    assert_eq!(req.header("Authorization"), Some("Bearer jwt-abc"));
}

#[test]
fn prepare_reads_token_from_storage_not_memory() {
    let transport = MockTransport::new();
    let (storage, session, client) = client_with(&transport);
    session.establish("jwt-1".into(), crate::net::types::User::default()).unwrap();
    storage.remove_item(TOKEN_KEY).unwrap();

    let req = client.prepare(Method::GET, &["profile"], None, &[]).unwrap();
    assert_eq!(req.header("Authorization"), None);
}

#[test]
fn prepare_joins_segments_onto_base_path() {
    let transport = MockTransport::new();
    let (_, _, client) = client_with(&transport);

    let req = client.prepare(Method::POST, &["bookings", "b-7", "confirm"], None, &[]).unwrap();
    assert_eq!(req.url, format!("{TEST_BASE_URL}/bookings/b-7/confirm"));
}

#[test]
fn prepare_percent_encodes_ids() {
    let transport = MockTransport::new();
    let (_, _, client) = client_with(&transport);

    let req = client.prepare(Method::GET, &["movies", "a b/c"], None, &[]).unwrap();
    assert_eq!(req.url, format!("{TEST_BASE_URL}/movies/a%20b%2Fc"));
}

#[test]
fn prepare_appends_query_pairs() {
    let transport = MockTransport::new();
    let (_, _, client) = client_with(&transport);

    let query = vec![("city".to_owned(), "Almaty".to_owned()), ("page".to_owned(), "2".to_owned())];
    let req = client.prepare(Method::GET, &["cinemas"], None, &query).unwrap();
    assert_eq!(req.url, format!("{TEST_BASE_URL}/cinemas?city=Almaty&page=2"));
}

#[test]
fn with_transport_rejects_invalid_base() {
    let transport = MockTransport::new();
    let session = SessionContext::load(Arc::new(crate::util::storage::MemoryStorage::new()));
    assert!(ApiClient::with_transport("not a url", session.clone(), transport.clone()).is_err());
    assert!(ApiClient::with_transport("mailto:desk@cinema.kz", session, transport).is_err());
}

// =============================================================================
// query_pairs / parsing helpers
// =============================================================================

#[test]
fn query_pairs_skips_unset_fields() {
    let query = MovieQuery { search: Some("Steppe".into()), min_rating: Some(7.5), ..MovieQuery::default() };
    let pairs = query_pairs(&query).unwrap();
    assert_eq!(
        pairs,
        vec![("minRating".to_owned(), "7.5".to_owned()), ("search".to_owned(), "Steppe".to_owned())]
    );
}

#[test]
fn query_pairs_renders_booleans() {
    let query = ShowtimeQuery { include_details: Some(true), ..ShowtimeQuery::default() };
    assert_eq!(query_pairs(&query).unwrap(), vec![("includeDetails".to_owned(), "true".to_owned())]);
}

#[test]
fn error_message_extracts_envelope_error() {
    assert_eq!(error_message(r#"{"success":false,"error":"Showtime not found"}"#).as_deref(), Some("Showtime not found"));
    assert_eq!(error_message("<html>bad gateway</html>"), None);
    assert_eq!(error_message(r#"{"success":false}"#), None);
}

#[test]
fn decode_data_requires_data_field() {
    let err = decode_data::<User>(serde_json::json!({ "success": true })).unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[test]
fn decode_page_treats_null_list_as_empty() {
    let page = decode_page::<Movie>(serde_json::json!({
        "success": true,
        "data": null,
        "pagination": { "page": 1, "limit": 10, "total": 0, "totalPages": 0 }
    }))
    .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.pagination.map(|p| p.total), Some(0));
}

// =============================================================================
// request pipeline
// =============================================================================

#[tokio::test]
async fn login_decodes_token_and_user() {
    let transport = MockTransport::new();
    transport.push(200, envelope(serde_json::json!({ "token": "jwt-9", "user": user_json("aida") })));
    let (_, _, client) = client_with(&transport);

    let creds = Credentials { email: "aida@example.kz".into(), password: "pw".into() };
    let payload = client.login(&creds).await.unwrap();
    assert_eq!(payload.token, "jwt-9");
    assert_eq!(payload.user.full_name, "aida");

    let req = transport.last_request();
    assert_eq!(req.method, Method::POST);
    assert_eq!(req.url, format!("{TEST_BASE_URL}/auth/login"));
    assert_eq!(req.body, Some(serde_json::json!({ "email": "aida@example.kz", "password": "pw" })));
}

#[tokio::test]
async fn get_movies_sends_filters_and_returns_page() {
    let transport = MockTransport::new();
    transport.push(
        200,
        serde_json::json!({
            "success": true,
            "data": [{ "id": "m-1", "title": "Steppe", "duration": 125 }],
            "pagination": { "page": 1, "limit": 10, "total": 1, "totalPages": 1 }
        }),
    );
    let (_, _, client) = client_with(&transport);

    let query = MovieQuery { genre: Some("Drama".into()), ..MovieQuery::default() };
    let page = client.get_movies(&query).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].duration, 125);
    assert_eq!(transport.last_request().url, format!("{TEST_BASE_URL}/movies?genre=Drama"));
}

#[tokio::test]
async fn cancel_booking_uses_delete() {
    let transport = MockTransport::new();
    transport.push(200, envelope(serde_json::json!({ "bookingId": "b-1", "cancelled": true })));
    let (_, _, client) = client_with(&transport);

    let result = client.cancel_booking("b-1").await.unwrap();
    assert!(result.cancelled);
    let req = transport.last_request();
    assert_eq!(req.method, Method::DELETE);
    assert_eq!(req.url, format!("{TEST_BASE_URL}/bookings/b-1"));
    assert_eq!(req.body, None);
}

#[tokio::test]
async fn health_reads_unwrapped_body() {
    let transport = MockTransport::new();
    transport.push(200, serde_json::json!({ "status": "ok", "message": "Cinema Booking API is running" }));
    let (_, _, client) = client_with(&transport);

    assert_eq!(client.health().await.unwrap().status, "ok");
}

#[tokio::test]
async fn unauthorized_response_clears_session() {
    let transport = MockTransport::new();
    transport.push(401, failure("Invalid or expired token"));
    let (storage, session, client) = client_with(&transport);
    session.establish("stale".into(), User::default()).unwrap();

    let err = client.get_profile().await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.server_message(), Some("Invalid or expired token"));
    assert!(!session.is_authenticated());
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
    assert_eq!(storage.get_item(USER_KEY).unwrap(), None);
}

#[tokio::test]
async fn unauthorized_login_keeps_session() {
    let transport = MockTransport::new();
    transport.push(401, failure("Invalid email or password"));
    let (storage, session, client) = client_with(&transport);
    session.establish("jwt-live".into(), User::default()).unwrap();

    let creds = Credentials { email: "aida@example.kz".into(), password: "wrong".into() };
    let err = client.login(&creds).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(session.token().as_deref(), Some("jwt-live"));
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap().as_deref(), Some("jwt-live"));
    assert_eq!(session.epoch(), 0);
}

#[tokio::test]
async fn forbidden_and_server_errors_keep_session() {
    for status in [403, 500, 502, 503, 400, 404] {
        let transport = MockTransport::new();
        transport.push(status, failure("nope"));
        let (_, session, client) = client_with(&transport);
        session.establish("jwt".into(), User::default()).unwrap();

        let err = client.get_my_bookings(&BookingQuery::default()).await.unwrap_err();
        assert_eq!(err.status(), Some(status));
        assert!(session.is_authenticated(), "status {status} must not clear the session");
    }
}

#[tokio::test]
async fn transport_failure_propagates_unchanged() {
    let transport = MockTransport::new();
    transport.push_error(ApiError::Transport("connection refused".into()));
    let (_, session, client) = client_with(&transport);
    session.establish("jwt".into(), User::default()).unwrap();

    let err = client.get_cinemas(&CinemaQuery::default()).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn non_json_success_body_is_decode_error() {
    let transport = MockTransport::new();
    transport.push(200, serde_json::Value::String("<html>".into()));
    let (_, _, client) = client_with(&transport);

    // A JSON string is valid JSON but not an envelope.
    let err = client.get_profile().await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn clearing_session_cancels_in_flight_request() {
    let transport = MockTransport::new();
    let (_, session, client) = client_with(&transport);
    session.establish("jwt".into(), User::default()).unwrap();

    let (result, ()) = tokio::join!(client.get_profile(), async {
        tokio::task::yield_now().await;
        session.clear();
    });
    assert!(matches!(result, Err(ApiError::Cancelled)));
    assert_eq!(transport.requests().len(), 1);
}
