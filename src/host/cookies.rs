//! Cookie store contract and two implementations.
//!
//! [`RequestCookieJar`] is backed by the inbound `Cookie` header and renders
//! writes as `Set-Cookie` values for the host to attach to its response.
//! [`MemoryCookieJar`] keeps everything in memory.

use std::sync::Mutex;

use super::url::decode_component;

/// Attributes applied to a cookie write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookieOptions {
    /// Cookie domain; `auto` lets the host pick the registrable domain.
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    /// Lifetime in seconds.
    pub max_age: i64,
}

impl CookieOptions {
    /// Render a `Set-Cookie` header value.
    pub fn to_set_cookie(&self, name: &str, value: &str) -> String {
        let mut out = format!("{}={}", name, value);
        if !self.domain.is_empty() && self.domain != "auto" {
            out.push_str("; Domain=");
            out.push_str(&self.domain);
        }
        out.push_str("; Path=");
        out.push_str(&self.path);
        out.push_str(&format!("; Max-Age={}", self.max_age));
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        out
    }
}

/// A cookie recorded by a store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub options: CookieOptions,
    /// Whether client-side scripts may read the value.
    pub client_readable: bool,
}

/// Cookie storage provided by the host.
pub trait CookieStore: Send + Sync {
    /// Persist a cookie.
    fn set(&self, name: &str, value: &str, options: &CookieOptions, client_readable: bool);

    /// All values for a cookie name, in order of appearance.
    fn get(&self, name: &str) -> Vec<String>;
}

/// Parse a `Cookie` header into name-value pairs.
pub fn parse_cookies(cookie_header: &str) -> Vec<(String, String)> {
    let mut cookies = Vec::with_capacity((cookie_header.matches(';').count() + 1).min(16));

    for cookie in cookie_header.split(';') {
        let cookie = cookie.trim();
        if cookie.is_empty() {
            continue;
        }

        let (name, value) = match cookie.find('=') {
            Some(pos) => (cookie[..pos].trim(), cookie[pos + 1..].trim()),
            None => continue,
        };

        if !name.is_empty() {
            cookies.push((name.to_string(), decode_component(value).into_owned()));
        }
    }

    cookies
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Cookie store backed by the inbound request.
///
/// Reads come from the `Cookie` header captured at construction; writes are
/// collected as `Set-Cookie` header values.
#[derive(Debug, Default)]
pub struct RequestCookieJar {
    inbound: Vec<(String, String)>,
    set_cookies: Mutex<Vec<String>>,
}

impl RequestCookieJar {
    pub fn new(cookie_header: Option<&str>) -> Self {
        Self {
            inbound: cookie_header.map(parse_cookies).unwrap_or_default(),
            set_cookies: Mutex::new(Vec::new()),
        }
    }

    /// Build from all `Cookie` headers of a request.
    pub fn from_headers(headers: &http::HeaderMap) -> Self {
        let joined = headers
            .get_all(http::header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect::<Vec<_>>()
            .join("; ");
        Self::new(Some(joined.as_str()).filter(|s| !s.is_empty()))
    }

    /// `Set-Cookie` values produced so far.
    pub fn set_cookie_headers(&self) -> Vec<String> {
        lock(&self.set_cookies).clone()
    }
}

impl CookieStore for RequestCookieJar {
    fn set(&self, name: &str, value: &str, options: &CookieOptions, _client_readable: bool) {
        lock(&self.set_cookies).push(options.to_set_cookie(name, value));
    }

    fn get(&self, name: &str) -> Vec<String> {
        self.inbound
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
            .collect()
    }
}

/// In-memory cookie store.
#[derive(Debug, Default)]
pub struct MemoryCookieJar {
    cookies: Mutex<Vec<StoredCookie>>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a cookie as if it had arrived with the request.
    pub fn with_cookie(self, name: &str, value: &str) -> Self {
        lock(&self.cookies).push(StoredCookie {
            name: name.to_string(),
            value: value.to_string(),
            options: CookieOptions {
                domain: "auto".to_string(),
                path: "/".to_string(),
                secure: false,
                http_only: false,
                max_age: 0,
            },
            client_readable: true,
        });
        self
    }

    /// All cookies currently held.
    pub fn cookies(&self) -> Vec<StoredCookie> {
        lock(&self.cookies).clone()
    }

    /// Most recent cookie stored under `name`.
    pub fn find(&self, name: &str) -> Option<StoredCookie> {
        lock(&self.cookies)
            .iter()
            .rev()
            .find(|c| c.name == name)
            .cloned()
    }
}

impl CookieStore for MemoryCookieJar {
    fn set(&self, name: &str, value: &str, options: &CookieOptions, client_readable: bool) {
        lock(&self.cookies).push(StoredCookie {
            name: name.to_string(),
            value: value.to_string(),
            options: options.clone(),
            client_readable,
        });
    }

    fn get(&self, name: &str) -> Vec<String> {
        lock(&self.cookies)
            .iter()
            .filter(|c| c.name == name)
            .map(|c| c.value.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> CookieOptions {
        CookieOptions {
            domain: "auto".to_string(),
            path: "/".to_string(),
            secure: true,
            http_only: true,
            max_age: 34_560_000,
        }
    }

    #[test]
    fn test_parse_cookies() {
        let cookies = parse_cookies("rc_uuid=abc; other=1; rc_uuid=def; broken; enc=a%20b");
        assert_eq!(
            cookies,
            vec![
                ("rc_uuid".to_string(), "abc".to_string()),
                ("other".to_string(), "1".to_string()),
                ("rc_uuid".to_string(), "def".to_string()),
                ("enc".to_string(), "a b".to_string()),
            ]
        );
    }

    #[test]
    fn test_set_cookie_rendering() {
        assert_eq!(
            options().to_set_cookie("rc_uuid", "abc"),
            "rc_uuid=abc; Path=/; Max-Age=34560000; Secure; HttpOnly"
        );

        let explicit = CookieOptions {
            domain: "shop.example".to_string(),
            http_only: false,
            ..options()
        };
        assert_eq!(
            explicit.to_set_cookie("rc_uuid", "abc"),
            "rc_uuid=abc; Domain=shop.example; Path=/; Max-Age=34560000; Secure"
        );
    }

    #[test]
    fn test_request_jar_reads_all_values() {
        let jar = RequestCookieJar::new(Some("rc_uuid=first; rc_uuid=second"));
        assert_eq!(jar.get("rc_uuid"), vec!["first", "second"]);
        assert!(jar.get("missing").is_empty());
    }

    #[test]
    fn test_request_jar_from_headers() {
        let mut headers = http::HeaderMap::new();
        headers.append(http::header::COOKIE, "a=1".parse().unwrap());
        headers.append(http::header::COOKIE, "rc_uuid=xyz".parse().unwrap());

        let jar = RequestCookieJar::from_headers(&headers);
        assert_eq!(jar.get("rc_uuid"), vec!["xyz"]);

        let empty = RequestCookieJar::from_headers(&http::HeaderMap::new());
        assert!(empty.get("rc_uuid").is_empty());
    }

    #[test]
    fn test_request_jar_records_writes() {
        let jar = RequestCookieJar::new(None);
        jar.set("rc_uuid", "abc", &options(), false);

        assert_eq!(
            jar.set_cookie_headers(),
            vec!["rc_uuid=abc; Path=/; Max-Age=34560000; Secure; HttpOnly"]
        );
    }

    #[test]
    fn test_memory_jar_roundtrip() {
        let jar = MemoryCookieJar::new().with_cookie("rc_uuid", "seeded");
        jar.set("rc_uuid", "fresh", &options(), false);

        assert_eq!(jar.get("rc_uuid"), vec!["seeded", "fresh"]);

        let latest = jar.find("rc_uuid").unwrap();
        assert_eq!(latest.value, "fresh");
        assert!(!latest.client_readable);
        assert_eq!(latest.options.max_age, 34_560_000);
        assert_eq!(jar.cookies().len(), 2);
    }
}
