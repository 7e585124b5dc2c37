//! Request parameter bags and their query-string encoding.
//!
//! Analytics APIs take a flat set of key/value pairs on every call. The
//! [`RequestParams`] type keeps those pairs sorted by key so that any
//! serialization derived from it (query strings, cache keys) is
//! deterministic regardless of the order in which callers inserted them.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

/// The reserved parameter key carrying the API authentication token.
///
/// Parameter bags passed to loggers must have this key stripped via
/// [`RequestParams::sanitized`].
pub const TOKEN_AUTH: &str = "token_auth";

/// A flat, ordered bag of request parameters.
///
/// Keys and values are plain strings; there is no nesting. Iteration is
/// always sorted ascending by key.
///
/// # Examples
///
/// ```
/// use analytica::RequestParams;
///
/// let mut params = RequestParams::new();
/// params.insert("idSite", "1");
/// params.insert("date", "today");
///
/// assert_eq!(params.get("idSite"), Some("1"));
/// assert_eq!(params.to_query_string(), "date=today&idSite=1");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams(BTreeMap<String, String>);

impl RequestParams {
    /// Creates an empty parameter bag.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Inserts a parameter, replacing any previous value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Returns the value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Removes and returns the value stored under `key`.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Returns `true` if a value is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns the number of parameters in the bag.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the bag holds no parameters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(key, value)` pairs in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Overlays `other` onto this bag.
    ///
    /// Values from `other` win on key collision; keys only present here are
    /// preserved.
    pub fn merge(&mut self, other: RequestParams) {
        self.0.extend(other.0);
    }

    /// Returns a copy of this bag with the authentication token removed.
    ///
    /// Every log event that carries parameter context uses this copy so the
    /// token never reaches log output.
    pub fn sanitized(&self) -> RequestParams {
        let mut copy = self.clone();
        copy.remove(TOKEN_AUTH);
        copy
    }

    /// Serializes the bag as a URL-encoded query string, sorted by key.
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.iter() {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }
}

impl fmt::Display for RequestParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for RequestParams {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.0
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for RequestParams {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl IntoIterator for RequestParams {
    type Item = (String, String);
    type IntoIter = btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
