//! Fixed-size Bloom filter used to accelerate SSTable point lookups.
//!
//! Unlike a filter that auto-sizes from an expected item count and target
//! false-positive rate, this one takes its bit count and hash count directly
//! from configuration, since every SSTable in an engine shares the same
//! filter shape (see `EngineConfig`). No false negative is possible; false
//! positives are expected and handled by falling through to the sparse
//! index.

use std::hash::Hasher;

/// A fixed-size Bloom filter over byte-string keys.
pub struct BloomFilter {
    bits: Vec<u8>,
    num_bits: u64,
    num_hashes: u32,
}

impl BloomFilter {
    /// Creates an empty filter with the given bit count and hash count.
    ///
    /// # Panics
    ///
    /// Panics if `num_bits` or `num_hashes` is zero.
    pub fn new(num_bits: u64, num_hashes: u32) -> Self {
        assert!(num_bits > 0, "num_bits must be > 0");
        assert!(num_hashes > 0, "num_hashes must be > 0");
        let byte_len = (num_bits as usize).div_ceil(8);
        Self {
            bits: vec![0u8; byte_len],
            num_bits,
            num_hashes,
        }
    }

    /// Adds a key to the filter.
    pub fn insert(&mut self, key: &[u8]) {
        for i in 0..self.num_hashes {
            let idx = self.bit_index(key, i);
            self.bits[(idx / 8) as usize] |= 1 << (idx % 8);
        }
    }

    /// Returns `false` only if `key` was definitely never inserted.
    pub fn may_contain(&self, key: &[u8]) -> bool {
        for i in 0..self.num_hashes {
            let idx = self.bit_index(key, i);
            if self.bits[(idx / 8) as usize] & (1 << (idx % 8)) == 0 {
                return false;
            }
        }
        true
    }

    pub fn num_bits(&self) -> u64 {
        self.num_bits
    }

    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// Computes `h_i(key) mod num_bits` using an FNV-1a hash re-keyed by seed `i`.
    fn bit_index(&self, key: &[u8], seed: u32) -> u64 {
        let mut hasher = SeededFnv::new(seed);
        hasher.write(key);
        hasher.finish() % self.num_bits
    }
}

impl std::fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloomFilter")
            .field("num_bits", &self.num_bits)
            .field("num_hashes", &self.num_hashes)
            .finish()
    }
}

/// FNV-1a variant seeded by mixing the seed into the initial basis.
///
/// Each `i` in `0..num_hashes` gets its own basis, standing in for the
/// per-index seeded hash the reference implementation gets from
/// `murmur3.Sum64WithSeed`.
struct SeededFnv {
    state: u64,
}

const FNV_PRIME: u64 = 0x100000001b3;
const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;

impl SeededFnv {
    fn new(seed: u32) -> Self {
        Self {
            state: FNV_OFFSET_BASIS ^ (seed as u64).wrapping_mul(FNV_PRIME),
        }
    }
}

impl Hasher for SeededFnv {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state ^= b as u64;
            self.state = self.state.wrapping_mul(FNV_PRIME);
        }
    }

    fn finish(&self) -> u64 {
        self.state
    }
}
