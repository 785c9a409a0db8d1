//! Purpose: Model the multi-valued parameter map the decoder reads from.
//! Exports: `Params`, `ParamMap`.
//! Role: Input boundary; adapts query strings and common map types to first-value lookup.
//! Invariants: Lookups only ever observe the first value stored for a key.
//! Invariants: `ParamMap` keeps repeated values in arrival order.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use serde::Serialize;
use url::Url;

/// First-value lookup over a string-keyed, possibly multi-valued map.
pub trait Params {
    fn first(&self, key: &str) -> Option<&str>;
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParamMap {
    entries: BTreeMap<String, Vec<String>>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` query; a leading `?` is ignored.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        url::form_urlencoded::parse(query.as_bytes())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    pub fn from_url(url: &Url) -> Self {
        url.query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .entry(key.into())
            .or_default()
            .push(value.into());
    }

    /// Replaces every value stored for `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), vec![value.into()]);
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.entries.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }
}

impl<K, V> FromIterator<(K, V)> for ParamMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ParamMap::new();
        map.extend(iter);
        map
    }
}

impl<K, V> Extend<(K, V)> for ParamMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.append(key, value);
        }
    }
}

impl From<BTreeMap<String, Vec<String>>> for ParamMap {
    fn from(entries: BTreeMap<String, Vec<String>>) -> Self {
        Self { entries }
    }
}

impl Params for ParamMap {
    fn first(&self, key: &str) -> Option<&str> {
        self.get(key)
    }
}

impl<P: Params + ?Sized> Params for &P {
    fn first(&self, key: &str) -> Option<&str> {
        (**self).first(key)
    }
}

impl<S: BuildHasher> Params for HashMap<String, Vec<String>, S> {
    fn first(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

impl Params for BTreeMap<String, Vec<String>> {
    fn first(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

impl<S: BuildHasher> Params for HashMap<String, String, S> {
    fn first(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

impl Params for BTreeMap<String, String> {
    fn first(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}
