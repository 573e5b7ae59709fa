//! Named entry points into the state table

use std::collections::BTreeMap;

/// Case-insensitive label -> state index table of a thing or weapon
///
/// A label set to state `0` is removed, matching how the engine treats the
/// NULL state as "no sequence".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateLabels {
    labels: BTreeMap<String, i32>,
}

impl StateLabels {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// State index for a label, or `0` when unset
    pub fn get(&self, label: &str) -> i32 {
        self.labels
            .get(&label.to_ascii_lowercase())
            .copied()
            .unwrap_or(0)
    }

    /// Set a label; `0` removes it
    pub fn set(&mut self, label: &str, index: i32) {
        let key = label.to_ascii_lowercase();
        if index == 0 {
            self.labels.remove(&key);
        } else {
            self.labels.insert(key, index);
        }
    }

    /// Whether a label is set
    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains_key(&label.to_ascii_lowercase())
    }

    /// Label names, lower-case and sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.labels.keys().map(String::as_str)
    }

    /// `(label, index)` pairs, sorted by label
    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.labels.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Remove every label
    pub fn clear(&mut self) {
        self.labels.clear();
    }

    /// Whether no label is set
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
