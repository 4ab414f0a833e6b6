//! Route values captured from a request path.
//!
//! Sample-site routes rarely capture more than a couple of values, so they
//! are kept inline in a small vector.

use smallvec::SmallVec;

/// Maximum number of values stored inline (stack allocated).
const INLINE_PARAMS: usize = 4;

/// Route values extracted from a matched path, in capture order.
///
/// # Example
///
/// ```rust
/// use testhost_router::Params;
///
/// let mut params = Params::new();
/// params.push("id", "5");
/// params.push("format", "json");
///
/// assert_eq!(params.get("format"), Some("json"));
/// assert_eq!(params.get_ignore_case("ID"), Some("5"));
/// assert_eq!(params.get("missing"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl Params {
    /// Creates a new empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a captured value.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the value for a parameter by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.find(|n| n == name)
    }

    /// Returns the value for a parameter, ignoring ASCII case in the name.
    #[must_use]
    pub fn get_ignore_case(&self, name: &str) -> Option<&str> {
        self.find(|n| n.eq_ignore_ascii_case(name))
    }

    fn find(&self, pred: impl Fn(&str) -> bool) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| pred(n))
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Drops every value captured after the first `len`.
    pub fn truncate(&mut self, len: usize) {
        self.inner.truncate(len);
    }

    /// Returns an iterator over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_get() {
        let mut params = Params::new();
        assert!(params.is_empty());

        params.push("controller", "Home");
        params.push("action", "Index");

        assert_eq!(params.len(), 2);
        assert_eq!(params.get("action"), Some("Index"));
        assert_eq!(params.get("Action"), None);
        assert_eq!(params.get_ignore_case("Action"), Some("Index"));
    }

    #[test]
    fn test_truncate() {
        let mut params = Params::new();
        params.push("a", "1");
        params.push("b", "2");
        params.push("c", "3");

        params.truncate(1);
        assert_eq!(params.iter().collect::<Vec<_>>(), vec![("a", "1")]);
    }

    #[test]
    fn test_spills_past_inline_capacity() {
        let params: Params = (0..10)
            .map(|i| (format!("key{i}"), format!("value{i}")))
            .collect();

        assert_eq!(params.len(), 10);
        assert_eq!(params.get("key7"), Some("value7"));
    }
}
