//! Case-insensitive name tables used by the context registries

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Map keyed by a case-insensitive name that remembers the first spelling
#[derive(Debug, Clone)]
pub struct NameMap<V> {
    entries: BTreeMap<String, (String, V)>,
}

impl<V> Default for NameMap<V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<V> NameMap<V> {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value, returning the previous one
    pub fn insert(&mut self, name: &str, value: V) -> Option<V> {
        let key = name.to_ascii_lowercase();
        match self.entries.get_mut(&key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.insert(key, (name.to_string(), value));
                None
            }
        }
    }

    /// Insert or replace a value and return it for editing
    pub fn put(&mut self, name: &str, value: V) -> &mut V {
        match self.entries.entry(name.to_ascii_lowercase()) {
            Entry::Occupied(entry) => {
                let slot = entry.into_mut();
                slot.1 = value;
                &mut slot.1
            }
            Entry::Vacant(entry) => &mut entry.insert((name.to_string(), value)).1,
        }
    }

    /// Value bound to a name
    pub fn get(&self, name: &str) -> Option<&V> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(|(_, value)| value)
    }

    /// Mutable value bound to a name
    pub fn get_mut(&mut self, name: &str) -> Option<&mut V> {
        self.entries
            .get_mut(&name.to_ascii_lowercase())
            .map(|(_, value)| value)
    }

    /// Whether a name is bound
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    /// Names as first spelled, in case-insensitive order
    pub fn names(&self) -> Vec<String> {
        self.entries.values().map(|(name, _)| name.clone()).collect()
    }

    /// Values in case-insensitive name order
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values().map(|(_, value)| value)
    }

    /// Number of bound names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no name is bound
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_spelling_kept() {
        let mut map = NameMap::new();
        assert_eq!(map.insert("Imp", 1), None);
        assert_eq!(map.insert("IMP", 2), Some(1));
        assert_eq!(map.get("imp"), Some(&2));
        assert_eq!(map.names(), vec!["Imp".to_string()]);
    }

    #[test]
    fn test_sorted_case_insensitively() {
        let mut map = NameMap::new();
        map.insert("zombie", ());
        map.insert("Baron", ());
        map.insert("arachnotron", ());
        assert_eq!(map.names(), vec!["arachnotron", "Baron", "zombie"]);
    }
}
