//! Per-invocation tag configuration.
//!
//! The host supplies the tag's UI fields as a JSON object with camelCase
//! keys. Fields keep their loose JSON typing where the UI may deliver either
//! strings or numbers; the accessors below apply the coercions.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::core::{EventKind, Result};
use crate::validate::{is_truthy, is_ui_field_true, make_integer};

/// Default cookie lifetime in days.
pub const DEFAULT_COOKIE_EXPIRATION_DAYS: i64 = 400;

/// Default query parameter carrying the click identifier.
pub const DEFAULT_CLICK_ID_PARAMETER: &str = "rc_uuid";

/// Console log policy (`logType`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogType {
    /// Not set: behaves like `Debug`.
    Unset,
    No,
    Debug,
    Always,
    /// Any other string: logging disabled.
    Unrecognized,
}

impl LogType {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            None | Some("") => LogType::Unset,
            Some("no") => LogType::No,
            Some("debug") => LogType::Debug,
            Some("always") => LogType::Always,
            Some(_) => LogType::Unrecognized,
        }
    }
}

/// Analytical log policy (`bigQueryLogType`). Opt-in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BigQueryLogType {
    Unset,
    No,
    Always,
    Unrecognized,
}

impl BigQueryLogType {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            None | Some("") => BigQueryLogType::Unset,
            Some("no") => BigQueryLogType::No,
            Some("always") => BigQueryLogType::Always,
            Some(_) => BigQueryLogType::Unrecognized,
        }
    }
}

/// Project/dataset/table address of the analytical log table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableRef {
    pub project_id: Option<String>,
    pub dataset_id: Option<String>,
    pub table_id: Option<String>,
}

impl TableRef {
    /// Whether all three parts are present.
    pub fn is_complete(&self) -> bool {
        [&self.project_id, &self.dataset_id, &self.table_id]
            .iter()
            .all(|p| p.as_deref().is_some_and(|s| !s.is_empty()))
    }
}

/// Tag configuration for one invocation.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TagConfig {
    /// Event type to handle: `page_view` or `conversion`.
    #[serde(rename = "type")]
    pub event_type: Option<String>,

    pub use_optimistic_scenario: Option<Value>,

    pub cookie_domain: Option<String>,
    pub cookie_http_only: Option<Value>,
    /// Cookie lifetime in days.
    pub cookie_expiration: Option<Value>,
    pub click_id_parameter_name: Option<String>,

    pub api_key: Option<Value>,
    pub click_id: Option<Value>,
    pub amount: Option<Value>,

    /// `Some` whenever the key was supplied, even as null or "".
    #[serde(deserialize_with = "present")]
    pub ip_address: Option<Value>,
    /// `Some` whenever the key was supplied, even as null or "".
    #[serde(deserialize_with = "present")]
    pub user_agent: Option<Value>,

    pub ad_storage_consent: Option<String>,

    pub log_type: Option<String>,
    pub big_query_log_type: Option<String>,
    pub log_big_query_project_id: Option<String>,
    pub log_big_query_dataset_id: Option<String>,
    pub log_big_query_table_id: Option<String>,
}

/// Keep explicit nulls as `Some(Value::Null)` so presence is observable.
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl TagConfig {
    /// Decode from the host's JSON object.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Resolve the configured event type.
    pub fn event_kind(&self) -> Result<EventKind> {
        self.event_type.as_deref().unwrap_or_default().parse()
    }

    /// Optimistic scenario toggle.
    #[inline]
    pub fn optimistic(&self) -> bool {
        is_ui_field_true(self.use_optimistic_scenario.as_ref())
    }

    /// Whether ad-storage consent must be checked.
    #[inline]
    pub fn consent_required(&self) -> bool {
        self.ad_storage_consent.as_deref() == Some("required")
    }

    /// Cookie domain, `auto` when unset or empty.
    pub fn cookie_domain(&self) -> &str {
        self.cookie_domain
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or("auto")
    }

    #[inline]
    pub fn cookie_http_only(&self) -> bool {
        is_truthy(self.cookie_http_only.as_ref())
    }

    /// Cookie lifetime in days; zero or unparsable values fall back to the default.
    pub fn cookie_expiration_days(&self) -> i64 {
        self.cookie_expiration
            .as_ref()
            .and_then(make_integer)
            .filter(|days| *days != 0)
            .unwrap_or(DEFAULT_COOKIE_EXPIRATION_DAYS)
    }

    /// Query parameter name the click identifier is read from.
    pub fn click_id_parameter_name(&self) -> &str {
        self.click_id_parameter_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_CLICK_ID_PARAMETER)
    }

    #[inline]
    pub fn log_type(&self) -> LogType {
        LogType::parse(self.log_type.as_deref())
    }

    #[inline]
    pub fn big_query_log_type(&self) -> BigQueryLogType {
        BigQueryLogType::parse(self.big_query_log_type.as_deref())
    }

    pub fn log_table(&self) -> TableRef {
        TableRef {
            project_id: self.log_big_query_project_id.clone(),
            dataset_id: self.log_big_query_dataset_id.clone(),
            table_id: self.log_big_query_table_id.clone(),
        }
    }
}
