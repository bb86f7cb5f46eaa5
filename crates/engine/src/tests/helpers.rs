use config::EngineConfig;

/// A config rooted at a fresh temp dir, with a tiny memtable threshold so
/// tests can trigger a flush in just a handful of writes.
pub fn small_config(root: impl Into<std::path::PathBuf>) -> EngineConfig {
    EngineConfig {
        root_data_dir: root.into(),
        memtable_size_threshold: 32,
        sstable_block_size: 64,
        sparse_wal_buffer_size: 8,
        bloom_filter_size: 4096,
        bloom_filter_hash_count: 4,
    }
}
