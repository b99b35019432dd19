//! Natural-key set used for duplicate detection

use std::collections::HashSet;

/// Natural keys considered "already used" during an ingestion run
///
/// Seeded from the store snapshot and grown as batches are written. Keys are
/// never removed within a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySet {
    keys: HashSet<String>,
}

impl KeySet {
    /// Create an empty key set
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a key is already used
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Add a key, returning true if it was not present
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.keys.insert(key.into())
    }

    /// Merge a batch of newly claimed keys
    pub fn merge<I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.keys.extend(keys);
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterate over the keys (unordered)
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}

impl FromIterator<String> for KeySet {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<&'a str> for KeySet {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        Self {
            keys: iter.into_iter().map(str::to_string).collect(),
        }
    }
}

impl IntoIterator for KeySet {
    type Item = String;
    type IntoIter = std::collections::hash_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.into_iter()
    }
}
