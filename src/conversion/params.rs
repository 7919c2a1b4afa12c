//! Conversion request parameters and URL construction.

use serde_json::Value;

use crate::config::TagConfig;
use crate::cookie::CLICK_ID_COOKIE;
use crate::core::EventEnvelope;
use crate::host::CookieStore;
use crate::validate::{encode_param, encode_str, is_truthy, is_valid_value, make_integer};

/// Parameters that must all be valid before a request is sent.
pub const REQUIRED_FIELDS: [&str; 3] = ["api_key", "rc_uuid", "amount"];

/// Query parameters of a conversion request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestParameters {
    pub api_key: Option<Value>,
    pub rc_uuid: Option<Value>,
    pub amount: Option<Value>,
    pub user_ip: Option<Value>,
    pub user_agent: Option<Value>,
}

impl RequestParameters {
    /// Collect parameters from the tag configuration, the event and the
    /// click-id cookie.
    ///
    /// `clickId` wins over the cookie when truthy. `ipAddress` and
    /// `userAgent` override the event whenever the key was supplied, even
    /// with an empty value.
    pub fn collect(config: &TagConfig, event: &EventEnvelope, cookies: &dyn CookieStore) -> Self {
        let rc_uuid = match config.click_id.as_ref() {
            Some(id) if is_truthy(Some(id)) => Some(id.clone()),
            _ => cookies
                .get(CLICK_ID_COOKIE)
                .into_iter()
                .next()
                .map(Value::String),
        };

        let amount = if is_valid_value(config.amount.as_ref()) {
            config.amount.as_ref().and_then(make_integer).map(Value::from)
        } else {
            None
        };

        let user_ip = match &config.ip_address {
            Some(ip) => Some(ip.clone()),
            None => event.ip_override.clone(),
        };

        let user_agent = match &config.user_agent {
            Some(ua) => Some(ua.clone()),
            None => event.user_agent.clone(),
        };

        Self {
            api_key: config.api_key.clone(),
            rc_uuid,
            amount,
            user_ip,
            user_agent,
        }
    }

    /// Parameters in wire order.
    pub fn entries(&self) -> [(&'static str, Option<&Value>); 5] {
        [
            ("api_key", self.api_key.as_ref()),
            ("rc_uuid", self.rc_uuid.as_ref()),
            ("amount", self.amount.as_ref()),
            ("user_ip", self.user_ip.as_ref()),
            ("user_agent", self.user_agent.as_ref()),
        ]
    }

    /// All required field names if any one of them is invalid.
    pub fn missing_required_fields(&self) -> Option<Vec<&'static str>> {
        let entries = self.entries();
        let any_missing = REQUIRED_FIELDS.iter().any(|name| {
            entries
                .iter()
                .find(|(key, _)| key == name)
                .map_or(true, |(_, value)| !is_valid_value(*value))
        });

        any_missing.then(|| REQUIRED_FIELDS.to_vec())
    }

    /// Query string of every valid parameter, without the leading `?`.
    pub fn query_string(&self) -> String {
        self.entries()
            .iter()
            .filter(|(_, value)| is_valid_value(*value))
            .map(|(key, value)| format!("{}={}", encode_str(key), encode_param(*value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Full request URL against `endpoint`.
    pub fn request_url(&self, endpoint: &str) -> String {
        format!("{}?{}", endpoint, self.query_string())
    }
}
