//! # Memtable
//!
//! An in-memory, sorted, mutable write buffer for the storage engine.
//!
//! The memtable is the first point of contact for every write operation. It
//! buffers recent `SET`/`DELETE` operations in a sorted structure
//! (`BTreeMap`) before they are flushed to an immutable on-disk SSTable.
//!
//! ## Key properties
//! - **Sorted order**: entries are always in ascending key order (required for SSTable flush).
//! - **Tombstone support**: deletes are recorded as `ValueEntry { value: None }` markers.
//! - **Approximate size tracking**: tracks the byte size of keys + values for flush threshold decisions.
//!
//! ## Example
//! ```rust
//! use memtable::Memtable;
//!
//! let mut m = Memtable::new();
//! m.set(b"hello".to_vec(), b"world".to_vec());
//! assert_eq!(m.get(b"hello").unwrap(), b"world".to_vec());
//!
//! m.delete(b"hello".to_vec());
//! assert!(m.get(b"hello").is_none());
//! ```

use std::collections::BTreeMap;

/// A single entry in the memtable.
///
/// - `value == Some(bytes)` — the key holds a live value.
/// - `value == None` — the key has been deleted (tombstone).
///
/// Tombstones are retained in the memtable and flushed to SSTables so that
/// older values in SSTables are correctly shadowed during reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueEntry {
    /// `Some(bytes)` for live values, `None` for tombstones (deletes).
    pub value: Option<Vec<u8>>,
}

/// An ordered, in-memory write buffer backed by a `BTreeMap`.
///
/// The memtable tracks an approximate byte size (keys + values) so the
/// engine can decide when to flush to an SSTable.
#[derive(Debug, Clone)]
pub struct Memtable {
    map: BTreeMap<Vec<u8>, ValueEntry>,
    approx_size: usize,
}

impl Memtable {
    /// Creates a new, empty memtable.
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
            approx_size: 0,
        }
    }

    /// Inserts or overwrites a key-value pair.
    pub fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        match self.map.get(&key) {
            Some(old) => {
                if let Some(ref ov) = old.value {
                    self.approx_size = self.approx_size.saturating_sub(ov.len());
                }
            }
            None => {
                self.approx_size = self.approx_size.saturating_add(key.len());
            }
        }

        self.approx_size = self.approx_size.saturating_add(value.len());
        self.map.insert(key, ValueEntry { value: Some(value) });
    }

    /// Records a tombstone (delete marker) for the given key.
    ///
    /// A tombstone is stored as `ValueEntry { value: None }`; it is never
    /// physically removed, since it must shadow any older value in a
    /// previously flushed SSTable.
    pub fn delete(&mut self, key: Vec<u8>) {
        match self.map.get(&key) {
            Some(old) => {
                if let Some(ref ov) = old.value {
                    self.approx_size = self.approx_size.saturating_sub(ov.len());
                }
            }
            None => {
                self.approx_size = self.approx_size.saturating_add(key.len());
            }
        }

        self.map.insert(key, ValueEntry { value: None });
    }

    /// Returns the live value for `key`, or `None` if the key is absent or a
    /// tombstone.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.map.get(key).and_then(|e| e.value.as_deref())
    }

    /// Returns the raw entry for `key`, including tombstones.
    ///
    /// Unlike [`get`](Memtable::get), this distinguishes "key not found"
    /// (`None`) from "key was deleted" (`Some(ValueEntry { value: None })`).
    pub fn get_entry(&self, key: &[u8]) -> Option<&ValueEntry> {
        self.map.get(key)
    }

    /// Returns an iterator over all entries in ascending key order,
    /// including tombstones.
    pub fn entries(&self) -> impl Iterator<Item = (&[u8], &ValueEntry)> {
        self.map.iter().map(|(k, v)| (k.as_slice(), v))
    }

    /// Returns the number of entries (including tombstones).
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns the approximate byte size of all keys and values stored.
    #[must_use]
    pub fn approx_size(&self) -> usize {
        self.approx_size
    }

    /// Returns `true` if the memtable contains zero entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns `true` if the memtable contains the given key (including tombstones).
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.map.contains_key(key)
    }

    /// Removes all entries and resets the size counter to zero.
    pub fn clear(&mut self) {
        self.map.clear();
        self.approx_size = 0;
    }
}

impl Default for Memtable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
