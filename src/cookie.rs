//! Page-view handling: persist the click id as a first-party cookie.

use crate::config::TagConfig;
use crate::core::{CompletionSignal, InvocationContext};
use crate::host::{parse_url, CookieOptions, CookieStore};

/// Cookie holding the click id between page view and conversion.
pub const CLICK_ID_COOKIE: &str = "rc_uuid";

const SECONDS_PER_DAY: i64 = 60 * 60 * 24;

/// Cookie attributes derived from the tag configuration.
pub fn cookie_options(config: &TagConfig) -> CookieOptions {
    CookieOptions {
        domain: config.cookie_domain().to_string(),
        path: "/".to_string(),
        secure: true,
        http_only: config.cookie_http_only(),
        max_age: config
            .cookie_expiration_days()
            .saturating_mul(SECONDS_PER_DAY),
    }
}

/// Read the click id from the page URL and store it.
///
/// Returns the stored value, if any. The handler never fails: success is
/// signalled whether or not a cookie was written.
pub fn handle_page_view(
    config: &TagConfig,
    ctx: &InvocationContext,
    cookies: &dyn CookieStore,
    signal: &CompletionSignal,
) -> Option<String> {
    let stored = store_click_id(config, ctx, cookies);
    signal.success();
    stored
}

fn store_click_id(
    config: &TagConfig,
    ctx: &InvocationContext,
    cookies: &dyn CookieStore,
) -> Option<String> {
    let url = ctx.url()?;
    let parsed = parse_url(url)?;

    let value = parsed
        .search_param(config.click_id_parameter_name())
        .filter(|v| !v.is_empty())?
        .to_string();

    cookies.set(CLICK_ID_COOKIE, &value, &cookie_options(config), false);
    tracing::debug!(trace_id = ?ctx.trace_id(), "click id cookie stored");

    Some(value)
}
