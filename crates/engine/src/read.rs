//! Read path: `get()`.
//!
//! Point lookups check the active memtable (freshest data), then the frozen
//! memtable (if a flush is in flight), then SSTables newest-first. The
//! first entry found for the key wins; a tombstone anywhere in that order
//! means the key is deleted and older SSTables are not consulted.

use sstable::Lookup;

use crate::Engine;

impl Engine {
    /// Returns the current value for `key`, or `None` if it is absent or
    /// has been deleted.
    pub fn get(&self, key: &[u8]) -> anyhow::Result<Option<Vec<u8>>> {
        let inner = &self.0;

        {
            let pair = inner.memtable.read().unwrap();
            if let Some(entry) = pair.active.get_entry(key) {
                return Ok(entry.value.clone());
            }
            if let Some(frozen) = &pair.frozen {
                if let Some(entry) = frozen.get_entry(key) {
                    return Ok(entry.value.clone());
                }
            }
        }

        let sstables = inner.sstables.read().unwrap();
        for table in sstables.iter() {
            match table.get(key)? {
                Lookup::Found(value) => return Ok(Some(value)),
                Lookup::Tombstone => return Ok(None),
                Lookup::Absent => continue,
            }
        }

        Ok(None)
    }
}
