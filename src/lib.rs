//! # cinema-client
//!
//! Client-side layer of the cinema ticket-booking application: a typed REST
//! client for the `/api` backend, a persisted auth session, the route table
//! with its authentication guard, and ru-RU display formatters.
//!
//! SYSTEM CONTEXT
//! ==============
//! A single [`state::session::SessionContext`] is built over one injected
//! [`util::storage::Storage`] and handed to the [`router::Router`], the
//! [`net::api::ApiClient`], and the [`state::auth::AuthStore`]. None of them
//! read global state, so each can be exercised in isolation.

pub mod config;
pub mod net;
pub mod router;
pub mod state;
pub mod util;
