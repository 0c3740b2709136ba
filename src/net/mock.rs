//! In-memory [`Transport`] for unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::api::ApiClient;
use super::error::ApiError;
use super::transport::{PreparedRequest, RawResponse, Transport};
use crate::state::session::SessionContext;
use crate::util::storage::MemoryStorage;

pub(crate) const TEST_BASE_URL: &str = "http://cinema.test/api";

/// Replays queued responses in order and records every request it sees.
/// With no responses queued, requests hang until cancelled.
#[derive(Default)]
pub(crate) struct MockTransport {
    responses: Mutex<Vec<Result<RawResponse, ApiError>>>,
    requests: Mutex<Vec<PreparedRequest>>,
}

impl MockTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn push(&self, status: u16, body: serde_json::Value) {
        self.responses.lock().unwrap().push(Ok(RawResponse { status, body: body.to_string() }));
    }

    pub(crate) fn push_error(&self, error: ApiError) {
        self.responses.lock().unwrap().push(Err(error));
    }

    pub(crate) fn requests(&self) -> Vec<PreparedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn last_request(&self) -> PreparedRequest {
        self.requests.lock().unwrap().last().cloned().expect("no request recorded")
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &PreparedRequest) -> Result<RawResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() { None } else { Some(responses.remove(0)) }
        };
        match next {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }
}

/// Fresh in-memory session plus a client wired to `transport`.
pub(crate) fn client_with(transport: &Arc<MockTransport>) -> (Arc<MemoryStorage>, SessionContext, ApiClient) {
    let storage = Arc::new(MemoryStorage::new());
    let session = SessionContext::load(storage.clone());
    let client = ApiClient::with_transport(TEST_BASE_URL, session.clone(), transport.clone()).unwrap();
    (storage, session, client)
}

pub(crate) fn envelope(data: serde_json::Value) -> serde_json::Value {
    serde_json::json!({ "success": true, "data": data })
}

pub(crate) fn failure(message: &str) -> serde_json::Value {
    serde_json::json!({ "success": false, "error": message })
}

pub(crate) fn user_json(name: &str) -> serde_json::Value {
    serde_json::json!({
        "id": format!("id-{name}"),
        "email": format!("{name}@example.kz"),
        "fullName": name,
        "role": "user",
        "wallet": { "balance": 1000.0, "currency": "KZT" }
    })
}
