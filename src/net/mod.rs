//! Networking modules for the booking REST API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` builds and classifies requests, `transport` performs the HTTP
//! exchange, `error` defines the failure taxonomy, and `types` defines the
//! wire schema.

pub mod api;
pub mod error;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;
