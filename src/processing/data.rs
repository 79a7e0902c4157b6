//! Case-insensitive configuration mapping.

use std::collections::btree_map::{self, BTreeMap};

/// Flat configuration produced from one secret.
///
/// Keys compare case-insensitively. Inserting a key that differs from an
/// existing one only by case overwrites the value and keeps the first-seen
/// spelling. Iteration is ordered by the case-folded key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationData {
    entries: BTreeMap<String, (String, Option<String>)>,
}

impl ConfigurationData {
    pub fn new() -> Self {
        Self::default()
    }

    fn fold(key: &str) -> String {
        key.to_lowercase()
    }

    pub fn insert(&mut self, key: String, value: Option<String>) {
        match self.entries.entry(Self::fold(&key)) {
            btree_map::Entry::Occupied(mut slot) => slot.get_mut().1 = value,
            btree_map::Entry::Vacant(slot) => {
                slot.insert((key, value));
            }
        }
    }

    /// `None` when the key is absent, `Some(None)` for a section or null value.
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.entries.get(&Self::fold(key)).map(|(_, value)| value.as_deref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&Self::fold(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries with their original key spelling.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.values().map(|(key, value)| (key.as_str(), value.as_deref()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|(key, _)| key.as_str())
    }
}

impl FromIterator<(String, Option<String>)> for ConfigurationData {
    fn from_iter<I: IntoIterator<Item = (String, Option<String>)>>(iter: I) -> Self {
        let mut data = Self::new();
        for (key, value) in iter {
            data.insert(key, value);
        }
        data
    }
}
