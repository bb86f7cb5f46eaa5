//! Engine configuration: plain data, no file/flag parsing.
//!
//! [`EngineConfig`] carries the tunables the storage engine needs; [`Dirs`]
//! resolves a root data directory into the concrete subpaths each component
//! reads and writes. Both are built from defaults or from environment
//! variables (see [`EngineConfig::from_env`]); parsing a config file or flag
//! set is left to callers outside this crate.

use std::path::{Path, PathBuf};

/// Tunables shared by every component of a running engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Root directory under which `wal/`, `sstables/`, and `indexes/` live.
    pub root_data_dir: PathBuf,
    /// Flush the active memtable once its byte size would reach this threshold.
    pub memtable_size_threshold: u64,
    /// Finalize an SSTable block once its file reaches this many bytes.
    pub sstable_block_size: u64,
    /// Bounded capacity of each SSTable's sparse-index persistence channel.
    pub sparse_wal_buffer_size: usize,
    /// Number of bits in each SSTable's Bloom filter.
    pub bloom_filter_size: u64,
    /// Number of hash functions applied per Bloom filter operation.
    pub bloom_filter_hash_count: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            root_data_dir: PathBuf::from("./data"),
            memtable_size_threshold: 4 * 1024 * 1024,
            sstable_block_size: 4 * 1024,
            sparse_wal_buffer_size: 1024,
            bloom_filter_size: 8 * 1024 * 1024,
            bloom_filter_hash_count: 7,
        }
    }
}

impl EngineConfig {
    /// Builds a config from environment variables, falling back to
    /// [`EngineConfig::default`] field-by-field when a variable is unset or
    /// fails to parse.
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            root_data_dir: std::env::var("KVSTORE_ROOT_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.root_data_dir),
            memtable_size_threshold: env_parsed("KVSTORE_MEMTABLE_THRESHOLD")
                .unwrap_or(default.memtable_size_threshold),
            sstable_block_size: env_parsed("KVSTORE_BLOCK_SIZE")
                .unwrap_or(default.sstable_block_size),
            sparse_wal_buffer_size: env_parsed("KVSTORE_SPARSE_BUFFER")
                .unwrap_or(default.sparse_wal_buffer_size),
            bloom_filter_size: env_parsed("KVSTORE_BLOOM_BITS").unwrap_or(default.bloom_filter_size),
            bloom_filter_hash_count: env_parsed("KVSTORE_BLOOM_HASHES")
                .unwrap_or(default.bloom_filter_hash_count),
        }
    }

    /// Resolves the directory layout rooted at `root_data_dir`.
    pub fn dirs(&self) -> Dirs {
        Dirs::new(&self.root_data_dir)
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Concrete subdirectories and file paths under a root data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dirs {
    root: PathBuf,
}

impl Dirs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn wal_dir(&self) -> PathBuf {
        self.root.join("wal")
    }

    pub fn commit_log_path(&self) -> PathBuf {
        self.wal_dir().join("wal.log")
    }

    pub fn meta_log_path(&self) -> PathBuf {
        self.wal_dir().join("wal.meta")
    }

    pub fn sstables_dir(&self) -> PathBuf {
        self.root.join("sstables")
    }

    pub fn sstable_dir(&self, id: u64) -> PathBuf {
        self.sstables_dir().join(id.to_string())
    }

    pub fn indexes_dir(&self) -> PathBuf {
        self.root.join("indexes")
    }

    pub fn index_path(&self, id: u64) -> PathBuf {
        self.indexes_dir().join(format!("{id}.index"))
    }

    /// Creates `wal/`, `sstables/`, and `indexes/` if they do not exist.
    pub fn ensure_exist(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.wal_dir())?;
        std::fs::create_dir_all(self.sstables_dir())?;
        std::fs::create_dir_all(self.indexes_dir())?;
        Ok(())
    }
}
