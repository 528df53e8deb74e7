use crate::error::{MultiMapError, Result};
use crate::serialization::Datum;

use std::collections::HashMap;

/// Key → bag storage for one (map name, partition) pair.
///
/// A bag keeps insertion order and holds each value at most once. A key is
/// present only while its bag is non-empty.
#[derive(Debug, Default, Clone)]
pub struct CollectionContainer {
    entries: HashMap<Datum, Vec<Datum>>,
}

impl CollectionContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value` to the key's bag. Returns false if the pair already exists.
    pub fn put(&mut self, key: Datum, value: Datum) -> bool {
        let bag = self.entries.entry(key).or_default();
        if bag.contains(&value) {
            return false;
        }
        bag.push(value);
        true
    }

    /// Snapshot of the key's bag; empty if the key is absent.
    pub fn get(&self, key: &Datum) -> Vec<Datum> {
        self.entries.get(key).cloned().unwrap_or_default()
    }

    pub fn remove(&mut self, key: &Datum, value: &Datum) -> bool {
        let Some(bag) = self.entries.get_mut(key) else {
            return false;
        };
        let Some(pos) = bag.iter().position(|v| v == value) else {
            return false;
        };
        bag.remove(pos);
        if bag.is_empty() {
            self.entries.remove(key);
        }
        true
    }

    pub fn remove_all(&mut self, key: &Datum) -> Vec<Datum> {
        self.entries.remove(key).unwrap_or_default()
    }

    pub fn key_set(&self) -> Vec<Datum> {
        self.entries.keys().cloned().collect()
    }

    pub fn values(&self) -> Vec<Datum> {
        self.entries.values().flatten().cloned().collect()
    }

    pub fn entry_set(&self) -> Vec<(Datum, Datum)> {
        self.entries
            .iter()
            .flat_map(|(key, bag)| bag.iter().map(move |value| (key.clone(), value.clone())))
            .collect()
    }

    /// Key only, value only, or exact pair; at least one must be given.
    pub fn contains(&self, key: Option<&Datum>, value: Option<&Datum>) -> Result<bool> {
        match (key, value) {
            (Some(key), Some(value)) => Ok(self
                .entries
                .get(key)
                .map(|bag| bag.contains(value))
                .unwrap_or(false)),
            (Some(key), None) => Ok(self.entries.contains_key(key)),
            (None, Some(value)) => Ok(self.entries.values().any(|bag| bag.contains(value))),
            (None, None) => Err(MultiMapError::InvalidArgument(
                "contains requires a key, a value, or both".to_string(),
            )),
        }
    }

    pub fn count(&self, key: &Datum) -> usize {
        self.entries.get(key).map(Vec::len).unwrap_or(0)
    }

    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    pub fn value_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Per-key value counts, for statistics snapshots.
    pub fn key_counts(&self) -> Vec<(Datum, usize)> {
        self.entries
            .iter()
            .map(|(key, bag)| (key.clone(), bag.len()))
            .collect()
    }
}
