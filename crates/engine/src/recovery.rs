//! Startup recovery: rebuild the active memtable from the WAL and reopen
//! every SSTable directory found on disk.

use config::{Dirs, EngineConfig};
use memtable::Memtable;
use sstable::SsTable;
use wal::Wal;

/// Replays commit-log records at or after the WAL's last flush watermark
/// into a fresh memtable.
pub(crate) fn replay_memtable(wal: &Wal) -> anyhow::Result<Memtable> {
    let watermark = wal.last_flush_watermark()?;
    let records = wal.records_after(watermark)?;

    let mut memtable = Memtable::new();
    for record in records {
        match record.value {
            Some(value) => memtable.set(record.key, value),
            None => memtable.delete(record.key),
        }
    }
    Ok(memtable)
}

/// Reopens every SSTable directory under `dirs`, sorted newest-first (`id`
/// descending, since `id` doubles as `createdAt`).
pub(crate) fn reopen_sstables(dirs: &Dirs, config: &EngineConfig) -> anyhow::Result<Vec<SsTable>> {
    let ids = sstable::list_sstable_ids(dirs)?;
    let mut tables = Vec::with_capacity(ids.len());
    for id in ids {
        tables.push(SsTable::open_existing(
            id,
            dirs,
            config.bloom_filter_size,
            config.bloom_filter_hash_count,
        )?);
    }
    tables.sort_unstable_by_key(|t| std::cmp::Reverse(t.id()));
    Ok(tables)
}
