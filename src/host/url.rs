//! Minimal URL parsing: query parameters of an absolute URL.

use std::borrow::Cow;

/// Percent decode, treating `+` as a space as form-encoded queries do.
#[inline]
pub fn decode_component(s: &str) -> Cow<'_, str> {
    if !s.contains('%') && !s.contains('+') {
        return Cow::Borrowed(s);
    }
    let spaced = s.replace('+', " ");
    Cow::Owned(
        percent_encoding::percent_decode_str(&spaced)
            .decode_utf8_lossy()
            .into_owned(),
    )
}

/// A URL split into the parts the relay inspects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedUrl {
    /// Decoded query pairs in order of appearance.
    pub search_params: Vec<(String, String)>,
}

impl ParsedUrl {
    /// First value of a query parameter.
    pub fn search_param(&self, name: &str) -> Option<&str> {
        self.search_params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Parse an absolute URL. Returns `None` when there is no `scheme://`.
pub fn parse_url(url: &str) -> Option<ParsedUrl> {
    let url = url.trim();
    let scheme_end = url.find("://")?;
    if scheme_end == 0 {
        return None;
    }

    let after_scheme = &url[scheme_end + 3..];
    let authority_len = after_scheme
        .find(|c| c == '/' || c == '?' || c == '#')
        .unwrap_or(after_scheme.len());

    let rest = &after_scheme[authority_len..];
    let rest = rest.split('#').next().unwrap_or_default();
    let query = rest.split_once('?').map(|(_, q)| q).unwrap_or_default();

    Some(ParsedUrl {
        search_params: parse_query_string(query),
    })
}

/// Parse a query string into decoded key-value pairs.
pub fn parse_query_string(query: &str) -> Vec<(String, String)> {
    let mut params = Vec::with_capacity((query.matches('&').count() + 1).min(16));

    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }

        let (key, value) = match pair.find('=') {
            Some(pos) => (&pair[..pos], &pair[pos + 1..]),
            None => (pair, ""),
        };

        if !key.is_empty() {
            params.push((
                decode_component(key).into_owned(),
                decode_component(value).into_owned(),
            ));
        }
    }

    params
}
