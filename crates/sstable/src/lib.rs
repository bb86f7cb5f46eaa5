//! # SSTable - Sorted String Table
//!
//! Immutable, on-disk storage files for the storage engine.
//!
//! When the in-memory [`memtable::Memtable`] crosses its size threshold, the
//! engine flushes it into a new [`SsTable`]: an ordered set of append-only
//! blocks, a sparse index mapping a subset of keys to the block that starts
//! at or before them, and a Bloom filter. SSTables are write-once: once a
//! flush completes, neither the blocks nor the index are modified again
//! (compaction is out of scope).
//!
//! ## On-disk layout
//!
//! ```text
//! sstables/<id>/<offset>.sst   one file per block, <offset> = cumulative
//!                              byte position of the block within the
//!                              SSTable's logical stream
//! indexes/<id>.index           sparse index, "key:offset\n" lines
//! ```
//!
//! `<id>` doubles as the SSTable's `createdAt` timestamp, since both are
//! assigned from the same flush-time clock reading.

mod block;
mod sstable;

pub use sstable::{list_sstable_ids, Lookup, SsTable};

#[derive(Debug, thiserror::Error)]
pub enum SsTableError {
    #[error("sstable io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt sparse index at line {line}")]
    Corrupt { line: usize },
    #[error("sparse index worker thread panicked")]
    WorkerPanicked,
}
