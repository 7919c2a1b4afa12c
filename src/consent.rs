//! Ad-storage consent gate.

use serde_json::Value;

use crate::config::TagConfig;
use crate::core::EventEnvelope;
use crate::validate::is_truthy;

/// Position of the ad-storage flag in the `x-ga-gcs` signal (e.g. `G110`).
const GCS_AD_STORAGE_INDEX: usize = 2;

/// Returns true when processing may continue.
///
/// Consent only matters when the tag requires it. An explicit
/// `consent_state` object takes precedence over the compact `x-ga-gcs`
/// signal.
pub fn is_consent_given_or_not_required(config: &TagConfig, event: &EventEnvelope) -> bool {
    if !config.consent_required() {
        return true;
    }

    if let Some(state) = event.consent_state.as_ref().filter(|s| is_truthy(Some(s))) {
        return is_truthy(state.get("ad_storage"));
    }

    gcs_grants_ad_storage(event.x_ga_gcs.as_ref())
}

/// Legacy fixed-position encoding: character 2 is `'1'` when granted.
fn gcs_grants_ad_storage(signal: Option<&Value>) -> bool {
    match signal {
        Some(Value::String(s)) => s.chars().nth(GCS_AD_STORAGE_INDEX) == Some('1'),
        _ => false,
    }
}
