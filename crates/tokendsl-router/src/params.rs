//! Captured path parameters.
//!
//! Captures are stored in a small vector so that the common case of one to
//! four parameters never touches the heap.

use smallvec::SmallVec;

const INLINE_PARAMS: usize = 4;

/// Path parameters captured by a route match, in template order.
///
/// # Example
///
/// ```rust
/// use tokendsl_router::Params;
///
/// let mut params = Params::new();
/// params.push("id", "42");
///
/// assert_eq!(params.get("id"), Some("42"));
/// assert_eq!(params.get("name"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl Params {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a captured parameter.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the captured value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of captures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Drops every capture after the first `len`.
    ///
    /// Used by the matcher to undo captures from a branch that failed.
    pub fn truncate(&mut self, len: usize) {
        self.inner.truncate(len);
    }

    /// Iterates over `(name, value)` pairs in capture order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a str, &'a str);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (String, String)>,
        fn(&'a (String, String)) -> (&'a str, &'a str),
    >;

    fn into_iter(self) -> Self::IntoIter {
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
    fn test_push_get() {
        let mut params = Params::new();
        assert!(params.is_empty());

        params.push("org", "acme");
        params.push("id", "7");

        assert_eq!(params.len(), 2);
        assert_eq!(params.get("org"), Some("acme"));
        assert_eq!(params.get("id"), Some("7"));
    }

    #[test]
    fn test_truncate() {
        let mut params = Params::new();
        params.push("a", "1");
        params.push("b", "2");
        params.truncate(1);

        assert_eq!(params.len(), 1);
        assert_eq!(params.get("b"), None);
    }

    #[test]
    fn test_iteration_order() {
        let params: Params = vec![
            ("x".to_string(), "1".to_string()),
            ("y".to_string(), "2".to_string()),
        ]
        .into_iter()
        .collect();

        let pairs: Vec<_> = (&params).into_iter().collect();
        assert_eq!(pairs, vec![("x", "1"), ("y", "2")]);
    }

    #[test]
    fn test_spills_past_inline_capacity() {
        let mut params = Params::new();
        for i in 0..8 {
            params.push(format!("p{i}"), i.to_string());
        }
        assert_eq!(params.len(), 8);
        assert_eq!(params.get("p7"), Some("7"));
    }
}
