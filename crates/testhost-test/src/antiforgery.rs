//! Anti-forgery token extraction.
//!
//! Sites render a hidden `__RequestVerificationToken` input in each form and
//! issue a matching cookie. A test copies both from a GET response into the
//! POST that follows:
//!
//! ```
//! use testhost_test::{antiforgery, TestRequest};
//!
//! let html = r#"<form action="/SimpleForms" method="post">
//!     <input name="__RequestVerificationToken" type="hidden" value="CfDJ8abc" />
//! </form>"#;
//!
//! let token = antiforgery::retrieve_antiforgery_token(html, "SimpleForms").unwrap();
//! let request = TestRequest::post("/SimpleForms")
//!     .form([(antiforgery::FORM_FIELD_NAME, token.as_str())]);
//! ```

use std::borrow::Cow;
use std::fmt;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::response::TestResponse;

/// Hidden form field carrying the request token.
pub const FORM_FIELD_NAME: &str = "__RequestVerificationToken";

/// Request header carrying the request token.
pub const HEADER_NAME: &str = "RequestVerificationToken";

/// Prefix of the anti-forgery cookie name.
pub const COOKIE_NAME_PREFIX: &str = ".AspNetCore.Antiforgery.";

/// Legacy cookie name prefix.
pub const LEGACY_COOKIE_NAME_PREFIX: &str = "__RequestVerificationToken";

// Tag bodies skip quoted runs so a `>` inside an attribute value does not
// end the tag.
static FORM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<form\b((?:[^>"']|"[^"]*"|'[^']*')*)>(.*?)</form\s*>"#)
        .expect("valid regex")
});

static INPUT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<input\b((?:[^>"']|"[^"]*"|'[^']*')*)>"#).expect("valid regex")
});

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)([a-z_:][-a-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
        .expect("valid regex")
});

static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|amp|lt|gt|quot|apos);").expect("valid regex")
});

/// The anti-forgery cookie issued alongside a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AntiforgeryCookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
}

impl AntiforgeryCookie {
    /// Formats the cookie as a `name=value` request pair.
    #[must_use]
    pub fn pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

impl fmt::Display for AntiforgeryCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pair())
    }
}

/// Returns the token of the first form posting to `action`.
///
/// A form matches when its `action` equals `action`, or when its path ends
/// with `/action`. Comparison ignores ASCII case. An empty `action` matches
/// a form whose action is empty or absent. Returns `None` when no form
/// matches or the matching form carries no token.
#[must_use]
pub fn retrieve_antiforgery_token(html: &str, action: &str) -> Option<String> {
    FORM.captures_iter(html)
        .filter(|form| action_matches(attribute(&form[1], "action").as_deref(), action))
        .find_map(|form| {
            INPUT.captures_iter(&form[2]).find_map(|input| {
                let name = attribute(&input[1], "name")?;
                if name.eq_ignore_ascii_case(FORM_FIELD_NAME) {
                    attribute(&input[1], "value")
                } else {
                    None
                }
            })
        })
}

/// Returns the first anti-forgery `Set-Cookie` of `response`.
#[must_use]
pub fn retrieve_antiforgery_cookie(response: &TestResponse) -> Option<AntiforgeryCookie> {
    response
        .set_cookies()
        .into_iter()
        .find(|cookie| {
            cookie.name.starts_with(COOKIE_NAME_PREFIX)
                || cookie.name.starts_with(LEGACY_COOKIE_NAME_PREFIX)
        })
        .map(|cookie| AntiforgeryCookie {
            name: cookie.name,
            value: cookie.value,
        })
}

fn action_matches(form_action: Option<&str>, action: &str) -> bool {
    let form_action = form_action.unwrap_or("").trim();
    let action = action.trim();
    if action.is_empty() {
        return form_action.is_empty();
    }

    let form_action = if action.contains('?') {
        form_action
    } else {
        form_action.split('?').next().unwrap_or(form_action)
    };
    if form_action.eq_ignore_ascii_case(action) {
        return true;
    }

    let suffix = format!("/{}", action.trim_start_matches('/'));
    form_action.len() >= suffix.len()
        && form_action.is_char_boundary(form_action.len() - suffix.len())
        && form_action[form_action.len() - suffix.len()..].eq_ignore_ascii_case(&suffix)
}

/// Returns the decoded value of attribute `name` in a tag's attribute text.
fn attribute(attributes: &str, name: &str) -> Option<String> {
    ATTRIBUTE.captures_iter(attributes).find_map(|captures| {
        if !captures[1].eq_ignore_ascii_case(name) {
            return None;
        }
        let value = match (captures.get(2).or_else(|| captures.get(3)), captures.get(4)) {
            (Some(quoted), _) => quoted.as_str(),
            // A trailing `/` on the last unquoted value belongs to `/>`.
            (None, Some(bare)) if bare.end() == attributes.len() => {
                bare.as_str().strip_suffix('/').unwrap_or(bare.as_str())
            }
            (None, Some(bare)) => bare.as_str(),
            (None, None) => "",
        };
        Some(decode_entities(value).into_owned())
    })
}

fn decode_entities(value: &str) -> Cow<'_, str> {
    ENTITY.replace_all(value, |captures: &Captures<'_>| {
        let entity = &captures[1];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => {
                let number = &entity[1..];
                let code = match number.strip_prefix(['x', 'X']) {
                    Some(hex) => u32::from_str_radix(hex, 16).ok(),
                    None => number.parse().ok(),
                };
                code.and_then(char::from_u32)
            }
        };
        decoded.map_or_else(|| captures[0].to_string(), String::from)
    })
}
