//! One tree level's insertion-ordered name → value store.
//!
//! A [`Structure`] holds the direct children of a single document node. Order
//! is preserved because it affects iteration, visiting, and textual
//! rendering — not lookup, and not equality.

use indexmap::IndexMap;

use crate::value::Value;

/// Insertion-ordered mapping from simple (unindexed) key names to values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Structure {
    entries: IndexMap<String, Value>,
}

impl Structure {
    /// Creates an empty structure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// Gets a mutable reference to the value stored under `name`.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.entries.get_mut(name)
    }

    /// Inserts a value, returning the previous one if present. A re-inserted
    /// key keeps its original position.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(name.into(), value)
    }

    /// Returns the value under `name`, inserting a freshly supplied one if
    /// the key is absent.
    pub fn entry_or_insert_with(
        &mut self,
        name: &str,
        default: impl FnOnce() -> Value,
    ) -> &mut Value {
        self.entries
            .entry(name.to_string())
            .or_insert_with(default)
    }

    /// Removes the value under `name`, preserving the order of the remaining
    /// entries.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.entries.shift_remove(name)
    }

    /// Returns true if the structure contains `name`.
    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of entries at this level.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if this level has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// Iterates key names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }
}

impl FromIterator<(String, Value)> for Structure {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Structure {
            entries: iter.into_iter().collect(),
        }
    }
}
