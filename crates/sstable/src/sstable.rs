use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use bloom::BloomFilter;
use config::Dirs;
use memtable::Memtable;

use crate::block::{self, BlockWriter};
use crate::SsTableError;

pub use crate::block::Lookup;

/// A persisted, immutable sorted snapshot of a memtable.
///
/// `id` doubles as the SSTable's creation timestamp (`createdAt`): the
/// engine assigns both from the same clock reading at flush time, so
/// sorting SSTables by `id` descending is sorting them newest-first.
pub struct SsTable {
    id: u64,
    dir: PathBuf,
    index_path: PathBuf,
    blocks: Vec<u64>,
    sparse_index: BTreeMap<Vec<u8>, u64>,
    bloom: BloomFilter,
}

impl SsTable {
    /// Creates an empty SSTable shell at `id`, ready to receive a [`flush`](SsTable::flush).
    pub fn create_for_flush(
        id: u64,
        dirs: &Dirs,
        bloom_bits: u64,
        bloom_hashes: u32,
    ) -> Result<Self, SsTableError> {
        let dir = dirs.sstable_dir(id);
        std::fs::create_dir_all(&dir)?;
        std::fs::create_dir_all(dirs.indexes_dir())?;
        Ok(Self {
            id,
            dir,
            index_path: dirs.index_path(id),
            blocks: Vec::new(),
            sparse_index: BTreeMap::new(),
            bloom: BloomFilter::new(bloom_bits, bloom_hashes),
        })
    }

    /// Reopens a previously flushed SSTable by scanning its directory: the
    /// block list from the `*.sst` filenames, the sparse index from its
    /// index file, and the Bloom filter by rescanning every block's keys
    /// (no Bloom artifact is persisted to disk).
    pub fn open_existing(
        id: u64,
        dirs: &Dirs,
        bloom_bits: u64,
        bloom_hashes: u32,
    ) -> Result<Self, SsTableError> {
        let dir = dirs.sstable_dir(id);
        let index_path = dirs.index_path(id);

        let mut blocks: Vec<u64> = std::fs::read_dir(&dir)?
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                e.path()
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(|s| s.parse::<u64>().ok())
            })
            .collect();
        blocks.sort_unstable();

        let mut sparse_index = BTreeMap::new();
        if index_path.exists() {
            let file = File::open(&index_path)?;
            for (line_no, line) in BufReader::new(file).lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let (key, offset) = line
                    .rsplit_once(':')
                    .ok_or(SsTableError::Corrupt { line: line_no + 1 })?;
                let offset: u64 = offset
                    .parse()
                    .map_err(|_| SsTableError::Corrupt { line: line_no + 1 })?;
                sparse_index.insert(key.as_bytes().to_vec(), offset);
            }
        }

        let mut bloom = BloomFilter::new(bloom_bits, bloom_hashes);
        for &base_offset in &blocks {
            let path = dir.join(format!("{base_offset}.sst"));
            for key in block::block_keys(&path)? {
                bloom.insert(&key);
            }
        }

        Ok(Self {
            id,
            dir,
            index_path,
            blocks,
            sparse_index,
            bloom,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Writes `memtable`'s records into this SSTable's blocks.
    ///
    /// Implements the flush algorithm: records are consumed in ascending
    /// key order, a new block starts whenever the current one reaches
    /// `block_size_threshold`, and the first key of every block is recorded
    /// in the sparse index and handed to a background worker over a
    /// bounded channel. The worker is joined before this call returns, so
    /// the index file is durable by the time `flush` completes.
    pub fn flush(
        &mut self,
        memtable: &Memtable,
        block_size_threshold: u64,
        sparse_buffer_size: usize,
    ) -> Result<(), SsTableError> {
        let (tx, rx) = mpsc::sync_channel::<(Vec<u8>, u64)>(sparse_buffer_size.max(1));
        let index_path = self.index_path.clone();
        let worker = thread::spawn(move || -> Result<(), SsTableError> {
            let mut f = OpenOptions::new().create(true).append(true).open(&index_path)?;
            for (key, offset) in rx {
                writeln!(f, "{}:{}", String::from_utf8_lossy(&key), offset)?;
            }
            f.flush()?;
            Ok(())
        });

        let mut base_offset: u64 = 0;
        let mut block_start = base_offset;
        let mut block = BlockWriter::create(&self.dir.join(format!("{block_start}.sst")))?;
        let mut first_of_block = true;

        for (key, entry) in memtable.entries() {
            if block.is_full(block_size_threshold) {
                self.blocks.push(block_start);
                block.close()?;
                block_start = base_offset;
                block = BlockWriter::create(&self.dir.join(format!("{block_start}.sst")))?;
                first_of_block = true;
            }

            if first_of_block {
                self.sparse_index.insert(key.to_vec(), block_start);
                // Receiver only drops if the worker thread panicked, which
                // `worker.join()` below surfaces as an error.
                let _ = tx.send((key.to_vec(), block_start));
                first_of_block = false;
            }

            self.bloom.insert(key);
            let written = block.add(key, entry.value.as_deref())?;
            base_offset += written;
        }

        self.blocks.push(block_start);
        block.close()?;

        drop(tx);
        match worker.join() {
            Ok(result) => result,
            Err(_) => Err(SsTableError::WorkerPanicked),
        }
    }

    /// Looks up `key`: a Bloom-filter miss short-circuits to [`Lookup::Absent`];
    /// otherwise the sparse index picks a starting block and blocks are
    /// scanned forward until the key is found or the SSTable is exhausted.
    pub fn get(&self, key: &[u8]) -> Result<Lookup, SsTableError> {
        if !self.bloom.may_contain(key) {
            return Ok(Lookup::Absent);
        }

        let start = self
            .sparse_index
            .range(..=key.to_vec())
            .next_back()
            .map(|(_, &offset)| offset)
            .unwrap_or(0);

        for &base_offset in self.blocks.iter().filter(|&&b| b >= start) {
            let path = self.dir.join(format!("{base_offset}.sst"));
            match block::scan_block_for_key(&path, key)? {
                Lookup::Absent => continue,
                found => return Ok(found),
            }
        }

        Ok(Lookup::Absent)
    }
}

/// Enumerates the SSTable ids present under `dirs.sstables_dir()`.
pub fn list_sstable_ids(dirs: &Dirs) -> Result<Vec<u64>, SsTableError> {
    let dir = dirs.sstables_dir();
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut ids: Vec<u64> = std::fs::read_dir(&dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .filter_map(|e| e.file_name().to_str().and_then(|s| s.parse::<u64>().ok()))
        .collect();
    ids.sort_unstable();
    Ok(ids)
}

#[cfg(test)]
mod tests;
