//! Write path: `set()`, `delete()`, and the internal `mutate()` they share.
//!
//! Every mutation is appended to the WAL commit log before it touches the
//! active memtable. Once the active memtable's approximate size reaches the
//! configured threshold, it is frozen and a fresh, empty memtable takes its
//! place; the just-written record lands in the fresh one. A background
//! thread then flushes the frozen snapshot to a new SSTable and, once that
//! completes, appends the SSTable's id as a watermark to the WAL meta log.

use std::sync::Arc;
use std::thread;

use memtable::Memtable;
use sstable::SsTable;

use crate::{contains_delimiter, current_timestamp, Engine, EngineError, Inner};

impl Engine {
    /// Inserts or overwrites `key` with `value`.
    pub fn set(&self, key: Vec<u8>, value: Vec<u8>) -> anyhow::Result<()> {
        self.mutate(key, Some(value))
    }

    /// Deletes `key`, recording a tombstone.
    pub fn delete(&self, key: Vec<u8>) -> anyhow::Result<()> {
        self.mutate(key, None)
    }

    fn mutate(&self, key: Vec<u8>, value: Option<Vec<u8>>) -> anyhow::Result<()> {
        if contains_delimiter(&key) || value.as_deref().is_some_and(contains_delimiter) {
            return Err(EngineError::InvalidKeyOrValue.into());
        }

        let inner = &self.0;
        let _write_guard = inner.write_lock.lock().unwrap();

        let ts = current_timestamp();
        inner.wal.write_commit(&key, value.as_deref(), ts)?;

        let record_size = (key.len() + value.as_deref().map_or(0, <[u8]>::len)) as u64;

        let just_froze = {
            let mut pair = inner.memtable.write().unwrap();
            let crossed_threshold = pair.active.approx_size() as u64 + record_size
                >= inner.config.memtable_size_threshold;
            let just_froze = crossed_threshold && pair.frozen.is_none();
            if just_froze {
                let frozen = std::mem::replace(&mut pair.active, Memtable::new());
                pair.frozen = Some(frozen);
            }

            match &value {
                Some(v) => pair.active.set(key, v.clone()),
                None => pair.active.delete(key),
            }

            just_froze
        };

        if just_froze {
            self.spawn_flush();
        }

        Ok(())
    }

    fn spawn_flush(&self) {
        let inner = Arc::clone(&self.0);
        let handle = thread::spawn(move || background_flush(inner));

        let mut slot = self.0.flush_handle.lock().unwrap();
        if let Some(previous) = slot.take() {
            // The previous flush only clears `frozen` once it is fully
            // done, and a new flush cannot start while `frozen` is set, so
            // by construction `previous` has already finished here.
            if let Ok(Err(e)) = previous.join() {
                tracing::warn!(error = %e, "previous flush failed");
            }
        }
        *slot = Some(handle);
    }
}

fn background_flush(inner: Arc<Inner>) -> anyhow::Result<()> {
    let frozen = {
        let pair = inner.memtable.read().unwrap();
        pair.frozen
            .clone()
            .expect("spawn_flush only runs after freezing a memtable")
    };

    let id = flush_snapshot(&inner, &frozen)?;

    {
        let mut pair = inner.memtable.write().unwrap();
        pair.frozen = None;
    }

    // Written only after the SSTable is fully durable: a crash between the
    // two leaves the frozen records in the commit log, safe to replay again.
    inner.wal.write_meta(id)?;
    tracing::info!(sstable_id = id, "flushed memtable to sstable");
    Ok(())
}

/// Builds a new SSTable from `snapshot` and registers it in `inner`. Shared
/// by the background flush path and the best-effort flush on drop; neither
/// clears `frozen` nor writes the meta watermark, since that step differs
/// between the two callers.
pub(crate) fn flush_snapshot(inner: &Inner, snapshot: &Memtable) -> anyhow::Result<u64> {
    let id = current_timestamp();
    let mut sst = SsTable::create_for_flush(
        id,
        &inner.dirs,
        inner.config.bloom_filter_size,
        inner.config.bloom_filter_hash_count,
    )?;
    sst.flush(
        snapshot,
        inner.config.sstable_block_size,
        inner.config.sparse_wal_buffer_size,
    )?;

    let mut sstables = inner.sstables.write().unwrap();
    sstables.push(sst);
    sstables.sort_unstable_by_key(|t| std::cmp::Reverse(t.id()));
    Ok(id)
}
