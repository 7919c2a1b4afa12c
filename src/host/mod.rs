//! Host collaborators.
//!
//! The relay runs inside a host that owns the inbound request, the cookie
//! jar and the notion of debug/preview mode. Everything the relay needs from
//! it is expressed here:
//!
//! - inbound headers as [`http::HeaderMap`], read through [`header_str`]
//! - [`parse_url`] for query parameters of the page URL
//! - the [`CookieStore`] trait
//! - [`RuntimeMode`] for debug/preview detection

mod cookies;
mod url;

pub use cookies::{
    parse_cookies, CookieOptions, CookieStore, MemoryCookieJar, RequestCookieJar, StoredCookie,
};
pub use url::{decode_component, parse_query_string, parse_url, ParsedUrl};

use http::HeaderMap;

/// Read a header as a non-empty string.
#[inline]
pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
}

/// Whether the container runs in a debug or preview session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RuntimeMode {
    pub debug: bool,
    pub preview: bool,
}

impl RuntimeMode {
    pub const LIVE: Self = Self {
        debug: false,
        preview: false,
    };

    pub const DEBUG: Self = Self {
        debug: true,
        preview: false,
    };

    pub const PREVIEW: Self = Self {
        debug: false,
        preview: true,
    };

    #[inline]
    pub fn is_debug(&self) -> bool {
        self.debug || self.preview
    }
}
