//! Block frame encoding and the append-only writer used during flush.
//!
//! Frame layout, big-endian: `<keyLen: u64><key><valueLen: u64><value>`.
//! A zero-length value encodes a tombstone.

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use crate::SsTableError;

/// What a block-level lookup found.
pub enum Lookup {
    Found(Vec<u8>),
    Tombstone,
    Absent,
}

pub(crate) fn encode_record(key: &[u8], value: Option<&[u8]>) -> Vec<u8> {
    let value_len = value.map_or(0, <[u8]>::len);
    let mut buf = Vec::with_capacity(16 + key.len() + value_len);
    buf.extend_from_slice(&(key.len() as u64).to_be_bytes());
    buf.extend_from_slice(key);
    buf.extend_from_slice(&(value_len as u64).to_be_bytes());
    if let Some(v) = value {
        buf.extend_from_slice(v);
    }
    buf
}

fn read_record<R: Read>(r: &mut R) -> Result<Option<(Vec<u8>, Vec<u8>)>, SsTableError> {
    let mut len_buf = [0u8; 8];
    if let Err(e) = r.read_exact(&mut len_buf) {
        return if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Ok(None)
        } else {
            Err(e.into())
        };
    }
    let key_len = u64::from_be_bytes(len_buf) as usize;
    let mut key = vec![0u8; key_len];
    r.read_exact(&mut key)?;

    r.read_exact(&mut len_buf)?;
    let value_len = u64::from_be_bytes(len_buf) as usize;
    let mut value = vec![0u8; value_len];
    r.read_exact(&mut value)?;

    Ok(Some((key, value)))
}

/// Scans a block file front-to-back for `key`.
pub(crate) fn scan_block_for_key(path: &Path, key: &[u8]) -> Result<Lookup, SsTableError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    while let Some((k, v)) = read_record(&mut reader)? {
        if k == key {
            return Ok(if v.is_empty() {
                Lookup::Tombstone
            } else {
                Lookup::Found(v)
            });
        }
    }
    Ok(Lookup::Absent)
}

/// Collects every key stored in a block file, tombstones included — used to
/// rebuild a Bloom filter at recovery time.
pub(crate) fn block_keys(path: &Path) -> Result<Vec<Vec<u8>>, SsTableError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut keys = Vec::new();
    while let Some((k, _)) = read_record(&mut reader)? {
        keys.push(k);
    }
    Ok(keys)
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.file_name().expect("block path has a file name"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Append-only writer for a single block file, used only during flush.
///
/// Writes land at a `.tmp` sibling of the final path and are renamed into
/// place on `close`, so a block never appears at its real name half-written.
pub(crate) struct BlockWriter {
    file: File,
    tmp_path: PathBuf,
    final_path: PathBuf,
    size: u64,
}

impl BlockWriter {
    pub(crate) fn create(path: &Path) -> Result<Self, SsTableError> {
        let tmp_path = tmp_sibling(path);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;
        Ok(Self {
            file,
            tmp_path,
            final_path: path.to_path_buf(),
            size: 0,
        })
    }

    /// Appends one record, returning the number of bytes written.
    pub(crate) fn add(&mut self, key: &[u8], value: Option<&[u8]>) -> Result<u64, SsTableError> {
        let frame = encode_record(key, value);
        self.file.write_all(&frame)?;
        self.size += frame.len() as u64;
        Ok(frame.len() as u64)
    }

    pub(crate) fn is_full(&self, threshold: u64) -> bool {
        self.size >= threshold
    }

    pub(crate) fn close(self) -> Result<(), SsTableError> {
        self.file.sync_all()?;
        std::fs::rename(&self.tmp_path, &self.final_path)?;
        Ok(())
    }
}
