//! `Set-Cookie` parsing and a client-side cookie jar.
//!
//! The jar keys cookies by name only. Every request targets the same
//! in-memory host, so `Domain` and `Path` are recorded but never used for
//! matching.

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use indexmap::IndexMap;
use parking_lot::Mutex;

/// A parsed `Set-Cookie` header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SetCookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value, surrounding quotes removed.
    pub value: String,
    /// `Path` attribute.
    pub path: Option<String>,
    /// `Domain` attribute.
    pub domain: Option<String>,
    /// `Max-Age` attribute in seconds.
    pub max_age: Option<i64>,
    /// Raw `Expires` attribute.
    pub expires: Option<String>,
    /// `Secure` flag.
    pub secure: bool,
    /// `HttpOnly` flag.
    pub http_only: bool,
    /// `SameSite` attribute.
    pub same_site: Option<String>,
}

impl SetCookie {
    /// Parses a `Set-Cookie` header value.
    ///
    /// Returns `None` when the first pair has no `=` or an empty name.
    /// Unknown attributes are ignored.
    ///
    /// # Example
    ///
    /// ```
    /// use testhost_test::SetCookie;
    ///
    /// let cookie = SetCookie::parse("session=abc; path=/; HttpOnly").unwrap();
    /// assert_eq!(cookie.name, "session");
    /// assert_eq!(cookie.value, "abc");
    /// assert_eq!(cookie.path.as_deref(), Some("/"));
    /// assert!(cookie.http_only);
    /// ```
    #[must_use]
    pub fn parse(header: &str) -> Option<Self> {
        let mut parts = header.split(';');
        let (name, value) = parts.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut cookie = Self {
            name: name.to_string(),
            value: value.trim().trim_matches('"').to_string(),
            ..Self::default()
        };

        for attribute in parts {
            let (key, value) = match attribute.split_once('=') {
                Some((key, value)) => (key.trim(), Some(value.trim())),
                None => (attribute.trim(), None),
            };
            match (key.to_ascii_lowercase().as_str(), value) {
                ("path", Some(v)) => cookie.path = Some(v.to_string()),
                ("domain", Some(v)) => cookie.domain = Some(v.to_string()),
                ("max-age", Some(v)) => cookie.max_age = v.parse().ok(),
                ("expires", Some(v)) => cookie.expires = Some(v.to_string()),
                ("samesite", Some(v)) => cookie.same_site = Some(v.to_string()),
                ("secure", _) => cookie.secure = true,
                ("httponly", _) => cookie.http_only = true,
                _ => {}
            }
        }

        Some(cookie)
    }

    /// Returns `true` if this header deletes the cookie.
    ///
    /// `Max-Age` takes precedence over `Expires`. Without it, an `Expires`
    /// date that is not in the future deletes the cookie.
    #[must_use]
    pub fn is_removal(&self) -> bool {
        match self.max_age {
            Some(age) => age <= 0,
            None => self.expires_at().is_some_and(|at| at <= SystemTime::now()),
        }
    }

    /// Returns the parsed `Expires` attribute.
    ///
    /// Accepts the HTTP date formats plus the dashed
    /// `Thu, 01-Jan-1970 00:00:00 GMT` form. Unparseable dates yield `None`.
    #[must_use]
    pub fn expires_at(&self) -> Option<SystemTime> {
        let raw = self.expires.as_deref()?;
        httpdate::parse_http_date(raw)
            .or_else(|_| httpdate::parse_http_date(&raw.replace('-', " ")))
            .ok()
    }

    /// Formats the cookie as a `name=value` request pair.
    #[must_use]
    pub fn pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

impl fmt::Display for SetCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pair())
    }
}

/// Cookies carried between requests of one client.
///
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: Arc<Mutex<IndexMap<String, String>>>,
}

impl CookieJar {
    /// Creates an empty jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a cookie, replacing one with the same name.
    pub fn insert(&self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.lock().insert(name.into(), value.into());
    }

    /// Applies a `Set-Cookie`, removing the cookie when it is expired.
    pub fn store(&self, cookie: &SetCookie) {
        if cookie.is_removal() {
            self.cookies.lock().shift_remove(&cookie.name);
        } else {
            self.insert(cookie.name.clone(), cookie.value.clone());
        }
    }

    /// Applies every cookie in `cookies`, in order.
    pub fn store_all<'a>(&self, cookies: impl IntoIterator<Item = &'a SetCookie>) {
        for cookie in cookies {
            self.store(cookie);
        }
    }

    /// Returns a cookie value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        self.cookies.lock().get(name).cloned()
    }

    /// Removes a cookie, returning its value.
    pub fn remove(&self, name: &str) -> Option<String> {
        self.cookies.lock().shift_remove(name)
    }

    /// Removes every cookie.
    pub fn clear(&self) {
        self.cookies.lock().clear();
    }

    /// Returns the number of cookies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.lock().len()
    }

    /// Returns `true` if the jar is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.lock().is_empty()
    }

    /// Returns every `(name, value)` pair, in insertion order.
    #[must_use]
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.cookies
            .lock()
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Formats the jar as a `Cookie` header value, in insertion order.
    #[must_use]
    pub fn header_value(&self) -> Option<String> {
        let cookies = self.cookies.lock();
        if cookies.is_empty() {
            return None;
        }
        Some(
            cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}
