//! Event envelope snapshot supplied by the host, and the event kinds the
//! relay routes on.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Map, Value};

/// Host-supplied event attributes, read once per invocation.
///
/// Only the attributes the relay consults are typed; everything else is kept
/// in [`EventEnvelope::extra`] untouched.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct EventEnvelope {
    /// Full URL of the page that produced the event.
    #[serde(default)]
    pub page_location: Option<String>,

    /// Client IP as forwarded by the collection client.
    #[serde(default)]
    pub ip_override: Option<Value>,

    /// Client user agent.
    #[serde(default)]
    pub user_agent: Option<Value>,

    /// Explicit consent object, e.g. `{"ad_storage": true}`.
    #[serde(default)]
    pub consent_state: Option<Value>,

    /// Compact consent signal string such as `"G110"`.
    #[serde(default, rename = "x-ga-gcs")]
    pub x_ga_gcs: Option<Value>,

    /// Remaining attributes.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventEnvelope {
    /// Build an envelope from an arbitrary JSON object.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    /// Page location, treating the empty string as absent.
    #[inline]
    pub fn page_location(&self) -> Option<&str> {
        self.page_location.as_deref().filter(|s| !s.is_empty())
    }

    /// Look up any attribute by its wire name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match key {
            "ip_override" => self.ip_override.as_ref(),
            "user_agent" => self.user_agent.as_ref(),
            "consent_state" => self.consent_state.as_ref(),
            "x-ga-gcs" => self.x_ga_gcs.as_ref(),
            _ => self.extra.get(key),
        }
    }
}

/// Event types with a handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    PageView,
    Conversion,
}

impl EventKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            EventKind::PageView => "page_view",
            EventKind::Conversion => "conversion",
        }
    }
}

impl FromStr for EventKind {
    type Err = crate::core::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "page_view" => Ok(EventKind::PageView),
            "conversion" => Ok(EventKind::Conversion),
            other => Err(crate::core::Error::UnknownEventType(other.to_string())),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
