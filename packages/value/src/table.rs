//! Ordered, string-keyed associative arrays.

use std::cmp::Ordering;
use std::collections::btree_map;
use std::collections::BTreeMap;

use crate::tokenizer::CharTokens;
use crate::value::Value;

/// A table key. Canonical non-negative integers sort numerically and
/// before every other key; the rest sort as strings.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Key(String);

impl Key {
    fn is_index(&self) -> bool {
        let bytes = self.0.as_bytes();
        match bytes {
            [] => false,
            [b'0'] => true,
            [b'0', ..] => false,
            _ => bytes.iter().all(u8::is_ascii_digit),
        }
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_index(), other.is_index()) {
            // Without leading zeros, a shorter index is a smaller one.
            (true, true) => self
                .0
                .len()
                .cmp(&other.0.len())
                .then_with(|| self.0.cmp(&other.0)),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Iterator over a table's entries in key order.
#[derive(Clone, Debug)]
pub struct Iter<'a> {
    inner: btree_map::Iter<'a, Key, Value>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, value)| (key.0.as_str(), value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// An associative array.
///
/// Key order is the order in which a table's keys become handles:
/// integer keys first in numeric order ("2" before "10"), then the
/// remaining keys sorted as strings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    entries: BTreeMap<Key, Value>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the array produced by splitting `s` into single characters.
    ///
    /// Keys are the 1-based positions.
    pub fn split_chars(s: &str) -> Self {
        CharTokens::new(s)
            .enumerate()
            .map(|(i, token)| ((i + 1).to_string(), Value::Str(token)))
            .collect()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(Key(key.into()), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(&Key(key.to_string()))
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(&Key(key.to_string()))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&Key(key.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in iteration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.0.as_str())
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.entries.iter(),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Table {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (Key(k.into()), v.into()))
                .collect(),
        }
    }
}

impl From<BTreeMap<String, Value>> for Table {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        entries.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = (&'a str, &'a Value);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
