//! Integration tests for rc_relay
//!
//! Pipeline scenarios run against in-memory collaborators; the HTTP
//! transport and the BigQuery REST table run against a local mock server.
//!
//! Run with: cargo test --test integration

mod helpers;

mod dispatcher;
mod transport;
