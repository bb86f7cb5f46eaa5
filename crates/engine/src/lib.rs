//! # Engine - LSM storage engine
//!
//! The central orchestrator tying together [`memtable`], [`wal`], and
//! [`sstable`] into a complete embedded key-value store.
//!
//! ## Architecture
//!
//! ```text
//! caller
//!   |
//!   v
//! ┌─────────────────────────────────────────────────────────┐
//! │                        Engine                            │
//! │                                                           │
//! │  set/delete -> WAL commit append -> active memtable       │
//! │    (threshold crossed) -> freeze + spawn background flush │
//! │                                                           │
//! │  get -> active memtable -> frozen memtable                │
//! │       -> SSTables newest-first, each bloom-gated           │
//! │                                                           │
//! │  background flush -> SsTable::flush -> publish into list  │
//! │                    -> wal.write_meta(watermark)            │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! `Engine` is a cheap, cloneable handle (an `Arc` around the shared state):
//! spawning a background flush from `&self` needs `'static` data, which an
//! `Arc`-backed handle provides without unsafe code.

mod read;
mod recovery;
mod write;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};
use std::thread::JoinHandle;

use config::EngineConfig;
use memtable::Memtable;
use sstable::SsTable;
use wal::Wal;

/// The active memtable and, while a flush is in flight, the frozen snapshot
/// being persisted. Both live under one lock so a freeze-and-swap is atomic
/// from a reader's point of view.
struct MemtablePair {
    active: Memtable,
    frozen: Option<Memtable>,
}

struct Inner {
    dirs: config::Dirs,
    config: EngineConfig,
    wal: Wal,
    memtable: RwLock<MemtablePair>,
    sstables: RwLock<Vec<SsTable>>,
    write_lock: Mutex<()>,
    flush_handle: Mutex<Option<JoinHandle<anyhow::Result<()>>>>,
}

/// Errors surfaced directly by the engine, as opposed to propagated from the
/// WAL or SSTable layers.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("key or value contains ':' or '\\n'")]
    InvalidKeyOrValue,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self.flush_handle.get_mut().unwrap().take() {
            if let Ok(Err(e)) = handle.join() {
                tracing::warn!(error = %e, "background flush failed during shutdown");
            }
        }

        // Best-effort: whatever is left in the active memtable at this point
        // is still safe on next open via WAL replay, so a failure here is
        // only logged, never propagated (Drop can't return a Result).
        let pending = {
            let pair = self.memtable.get_mut().unwrap();
            if pair.active.is_empty() {
                None
            } else {
                Some(std::mem::take(&mut pair.active))
            }
        };

        if let Some(snapshot) = pending {
            match write::flush_snapshot(self, &snapshot) {
                Ok(id) => {
                    if let Err(e) = self.wal.write_meta(id) {
                        tracing::warn!(error = %e, "failed to record watermark for drop-time flush");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "best-effort flush on drop failed"),
            }
        }
    }
}

/// A handle to a running storage engine. Cloning an `Engine` is cheap and
/// yields another handle to the same underlying state.
#[derive(Clone)]
pub struct Engine(Arc<Inner>);

impl Engine {
    /// Opens (or creates) an engine rooted at `config.root_data_dir`.
    ///
    /// Recovery replays every commit-log record at or after the WAL's last
    /// flush watermark into a fresh memtable, then reopens every SSTable
    /// directory found on disk.
    pub fn open(config: EngineConfig) -> anyhow::Result<Self> {
        let dirs = config.dirs();
        dirs.ensure_exist()?;

        let wal = Wal::open(dirs.commit_log_path(), dirs.meta_log_path())?;
        let memtable = recovery::replay_memtable(&wal)?;
        let sstables = recovery::reopen_sstables(&dirs, &config)?;

        tracing::info!(
            replayed_keys = memtable.len(),
            sstables = sstables.len(),
            "engine recovered"
        );

        Ok(Self(Arc::new(Inner {
            dirs,
            config,
            wal,
            memtable: RwLock::new(MemtablePair {
                active: memtable,
                frozen: None,
            }),
            sstables: RwLock::new(sstables),
            write_lock: Mutex::new(()),
            flush_handle: Mutex::new(None),
        })))
    }

    /// Waits for any in-flight flush to finish. The engine must not be used
    /// for further `Set`/`Delete`/`Get` calls after this returns.
    pub fn close(&self) -> anyhow::Result<()> {
        let _guard = self.0.write_lock.lock().unwrap();
        let handle = self.0.flush_handle.lock().unwrap().take();
        if let Some(handle) = handle {
            match handle.join() {
                Ok(result) => result?,
                Err(_) => anyhow::bail!("background flush thread panicked"),
            }
        }
        Ok(())
    }

    /// Byte size of the active memtable, for diagnostics (`STATS` in the CLI).
    pub fn active_memtable_size(&self) -> usize {
        self.0.memtable.read().unwrap().active.approx_size()
    }

    /// Number of SSTables currently on disk, for diagnostics.
    pub fn sstable_count(&self) -> usize {
        self.0.sstables.read().unwrap().len()
    }

    /// Root data directory this engine was opened with.
    pub fn root_dir(&self) -> PathBuf {
        self.0.dirs.root().to_path_buf()
    }
}

fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_millis() as u64
}

fn contains_delimiter(bytes: &[u8]) -> bool {
    bytes.contains(&b':') || bytes.contains(&b'\n')
}

#[cfg(test)]
mod tests;
