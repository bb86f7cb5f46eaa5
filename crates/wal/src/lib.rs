//! Write-ahead log: a commit log and a meta log, both plain text.
//!
//! The commit log records every mutation as `<key>:<value>:<timestamp>\n`
//! (an empty value field means a tombstone). The meta log records the
//! timestamp of each completed flush as `<timestamp>\n`; its last line is
//! the **watermark**, the point before which the commit log's records are
//! already reflected in a persisted SSTable. Recovery reads the watermark
//! once, then replays only commit-log records at or after it.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A single write-ahead log record: a key and either a value or a tombstone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalRecord {
    pub key: Vec<u8>,
    pub value: Option<Vec<u8>>,
}

#[derive(Debug, thiserror::Error)]
pub enum WalError {
    #[error("wal io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt wal record at line {line}")]
    Corrupt { line: usize },
}

/// A write-ahead log rooted at a pair of files: the commit log and the meta log.
pub struct Wal {
    commit_path: PathBuf,
    meta_path: PathBuf,
    commit_lock: Mutex<()>,
    meta_lock: Mutex<()>,
}

impl Wal {
    /// Opens (creating if necessary) the commit log and meta log at the
    /// given paths.
    pub fn open(
        commit_path: impl Into<PathBuf>,
        meta_path: impl Into<PathBuf>,
    ) -> Result<Self, WalError> {
        let commit_path = commit_path.into();
        let meta_path = meta_path.into();
        touch(&commit_path)?;
        touch(&meta_path)?;
        Ok(Self {
            commit_path,
            meta_path,
            commit_lock: Mutex::new(()),
            meta_lock: Mutex::new(()),
        })
    }

    /// Appends one mutation to the commit log. `value = None` records a
    /// tombstone (a `Delete`).
    pub fn write_commit(&self, key: &[u8], value: Option<&[u8]>, ts: u64) -> Result<(), WalError> {
        let _guard = self.commit_lock.lock().unwrap();
        let line = encode_commit_line(key, value, ts);
        append_line(&self.commit_path, &line)
    }

    /// Appends a flush-completion watermark to the meta log.
    pub fn write_meta(&self, ts: u64) -> Result<(), WalError> {
        let _guard = self.meta_lock.lock().unwrap();
        append_line(&self.meta_path, format!("{ts}\n").as_bytes())
    }

    /// Returns the timestamp on the meta log's last non-empty line, or `0`
    /// if the meta log is empty or does not yet exist.
    pub fn last_flush_watermark(&self) -> Result<u64, WalError> {
        let _guard = self.meta_lock.lock().unwrap();
        let contents = match std::fs::read_to_string(&self.meta_path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        match contents.lines().rev().find(|l| !l.trim().is_empty()) {
            Some(line) => line
                .trim()
                .parse::<u64>()
                .map_err(|_| WalError::Corrupt { line: 0 }),
            None => Ok(0),
        }
    }

    /// Scans the commit log and returns every record with timestamp `>=
    /// ts`, deduplicated by key (keeping the most recent occurrence).
    pub fn records_after(&self, ts: u64) -> Result<Vec<WalRecord>, WalError> {
        let _guard = self.commit_lock.lock().unwrap();
        let file = match std::fs::File::open(&self.commit_path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let reader = BufReader::new(file);

        // Preserves insertion order of first-seen keys but always retains
        // the latest occurrence's value, since the commit log is append-only
        // in timestamp order.
        let mut by_key: HashMap<Vec<u8>, (u64, Option<Vec<u8>>)> = HashMap::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let (key, value, record_ts) = decode_commit_line(&line, line_no + 1)?;
            if record_ts >= ts {
                by_key.insert(key, (record_ts, value));
            }
        }

        Ok(by_key
            .into_iter()
            .map(|(key, (_, value))| WalRecord { key, value })
            .collect())
    }
}

fn touch(path: &Path) -> Result<(), WalError> {
    OpenOptions::new().create(true).append(true).open(path)?;
    Ok(())
}

fn append_line(path: &Path, line: &[u8]) -> Result<(), WalError> {
    let mut f = OpenOptions::new().create(true).append(true).open(path)?;
    f.write_all(line)?;
    f.flush()?;
    Ok(())
}

fn encode_commit_line(key: &[u8], value: Option<&[u8]>, ts: u64) -> Vec<u8> {
    let mut line = Vec::with_capacity(key.len() + value.map_or(0, <[u8]>::len) + 24);
    line.extend_from_slice(key);
    line.push(b':');
    if let Some(v) = value {
        line.extend_from_slice(v);
    }
    line.push(b':');
    line.extend_from_slice(ts.to_string().as_bytes());
    line.push(b'\n');
    line
}

fn decode_commit_line(
    line: &str,
    line_no: usize,
) -> Result<(Vec<u8>, Option<Vec<u8>>, u64), WalError> {
    let mut parts = line.splitn(3, ':');
    let key = parts.next().ok_or(WalError::Corrupt { line: line_no })?;
    let value = parts.next().ok_or(WalError::Corrupt { line: line_no })?;
    let ts = parts.next().ok_or(WalError::Corrupt { line: line_no })?;
    if parts.next().is_some() {
        return Err(WalError::Corrupt { line: line_no });
    }
    let ts: u64 = ts.parse().map_err(|_| WalError::Corrupt { line: line_no })?;
    let value = if value.is_empty() {
        None
    } else {
        Some(value.as_bytes().to_vec())
    };
    Ok((key.as_bytes().to_vec(), value, ts))
}
