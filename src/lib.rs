//! rc_relay - server-side RevContent event relay.
//!
//! The relay receives one analytics event at a time from a tag-management
//! host and either stores the RevContent click id as a first-party cookie
//! (`page_view`) or reports a conversion to the RevContent conversion API
//! (`conversion`). Every step can be logged to a structured console sink and
//! to a BigQuery table.
//!
//! # Pipeline
//!
//! - [`consent`] - ad-storage consent gate
//! - [`dispatcher`] - entry point, routing and exactly-once completion
//! - [`cookie`] - page-view handler
//! - [`conversion`] - request parameters, URL building, conversion handler
//! - [`logger`] - log record fan-out to console and BigQuery sinks
//!
//! Host collaborators live in [`host`] (headers, URL parsing, cookies,
//! runtime mode) and [`transport`] (outbound HTTP).
//!
//! # Example
//!
//! ```rust,ignore
//! use rc_relay::config::Config;
//! use rc_relay::dispatcher::Relay;
//! use rc_relay::host::{RequestCookieJar, RuntimeMode};
//!
//! let config = Config::from_env()?;
//! rc_relay::logging::init(&config.logging)?;
//! let relay = Relay::from_config(&config)?;
//!
//! let cookies = RequestCookieJar::from_headers(&headers);
//! let invocation = relay.handle_json(tag_json, event_json, &headers, &cookies, RuntimeMode::LIVE)?;
//! let outcome = invocation.finish().await;
//! ```

/// Package version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod consent;
pub mod conversion;
pub mod cookie;
pub mod core;
pub mod dispatcher;
pub mod host;
pub mod logger;
pub mod logging;
pub mod transport;
pub mod validate;

pub use crate::core::{Error, Outcome, Result};
pub use dispatcher::{Invocation, Relay};
