use super::*;

// -------------------- Basic CRUD --------------------

#[test]
fn set_and_get_single_key() {
    let mut m = Memtable::new();
    m.set(b"k1".to_vec(), b"v1".to_vec());
    assert_eq!(m.len(), 1);
    assert_eq!(m.get(b"k1").unwrap(), b"v1");
}

#[test]
fn set_overwrites_previous_value() {
    let mut m = Memtable::new();
    m.set(b"k1".to_vec(), b"v1".to_vec());
    m.set(b"k1".to_vec(), b"v2".to_vec());
    assert_eq!(m.get(b"k1").unwrap(), b"v2");
}

#[test]
fn get_missing_key_returns_none() {
    let m = Memtable::new();
    assert!(m.get(b"nonexistent").is_none());
}

#[test]
fn delete_creates_tombstone() {
    let mut m = Memtable::new();
    m.set(b"k1".to_vec(), b"v1".to_vec());
    m.delete(b"k1".to_vec());
    assert!(m.get(b"k1").is_none());
    assert_eq!(m.len(), 1); // tombstone still present
}

// -------------------- Load / write tests --------------------

#[test]
fn write_load_10k_unique_keys() {
    let mut m = Memtable::new();
    for i in 0..10_000u64 {
        let key = format!("key{}", i).into_bytes();
        let val = vec![b'x'; 100];
        m.set(key, val);
    }
    assert_eq!(m.len(), 10_000);
}

#[test]
fn write_load_with_key_reuse() {
    let mut m = Memtable::new();
    for i in 0..100_000u64 {
        let key = format!("key{}", i % 1_000).into_bytes();
        m.set(key, vec![b'x'; 50]);
    }
    assert_eq!(m.len(), 1_000);
}

// -------------------- Iterator ordering --------------------

#[test]
fn entries_yield_sorted_keys() {
    let mut m = Memtable::new();
    m.set(b"c".to_vec(), b"3".to_vec());
    m.set(b"a".to_vec(), b"1".to_vec());
    m.set(b"b".to_vec(), b"2".to_vec());

    let keys: Vec<&[u8]> = m.entries().map(|(k, _)| k).collect();
    assert_eq!(
        keys,
        vec![b"a".as_slice(), b"b".as_slice(), b"c".as_slice()]
    );
}

#[test]
fn entries_include_tombstones() {
    let mut m = Memtable::new();
    m.set(b"a".to_vec(), b"1".to_vec());
    m.delete(b"b".to_vec());
    m.set(b"c".to_vec(), b"3".to_vec());

    let entries: Vec<_> = m.entries().collect();
    assert_eq!(entries.len(), 3);
    assert!(entries[1].1.value.is_none()); // "b" is tombstone
}

#[test]
fn entries_on_empty_memtable() {
    let m = Memtable::new();
    assert_eq!(m.entries().count(), 0);
}

// -------------------- contains_key --------------------

#[test]
fn contains_key_live_value() {
    let mut m = Memtable::new();
    m.set(b"k".to_vec(), b"v".to_vec());
    assert!(m.contains_key(b"k"));
}

#[test]
fn contains_key_tombstone() {
    let mut m = Memtable::new();
    m.delete(b"k".to_vec());
    assert!(m.contains_key(b"k"));
}

#[test]
fn contains_key_missing() {
    let m = Memtable::new();
    assert!(!m.contains_key(b"k"));
}

// -------------------- approx_size tracking --------------------

#[test]
fn approx_size_includes_key_and_value() {
    let mut m = Memtable::new();
    assert_eq!(m.approx_size(), 0);
    // key="ab" (2) + value="ccc" (3) = 5
    m.set(b"ab".to_vec(), b"ccc".to_vec());
    assert_eq!(m.approx_size(), 5);
}

#[test]
fn approx_size_adjusts_on_overwrite() {
    let mut m = Memtable::new();
    m.set(b"a".to_vec(), b"aaa".to_vec()); // key=1 + val=3 = 4
    assert_eq!(m.approx_size(), 4);
    m.set(b"a".to_vec(), b"bb".to_vec()); // key=1 + val=2 = 3
    assert_eq!(m.approx_size(), 3);
}

#[test]
fn approx_size_adjusts_on_delete() {
    let mut m = Memtable::new();
    m.set(b"a".to_vec(), b"aaa".to_vec()); // 1+3=4
    m.delete(b"a".to_vec()); // value removed, key stays -> 1
    assert_eq!(m.approx_size(), 1);
}

// -------------------- Clear --------------------

#[test]
fn clear_resets_everything() {
    let mut m = Memtable::new();
    m.set(b"a".to_vec(), b"1".to_vec());
    m.set(b"b".to_vec(), b"2".to_vec());
    assert!(!m.is_empty());
    assert!(m.approx_size() > 0);

    m.clear();
    assert_eq!(m.len(), 0);
    assert_eq!(m.approx_size(), 0);
    assert!(m.is_empty());
    assert!(m.get(b"a").is_none());
}

#[test]
fn clear_then_reuse() {
    let mut m = Memtable::new();
    m.set(b"old".to_vec(), b"data".to_vec());
    m.clear();
    m.set(b"new".to_vec(), b"data".to_vec());
    assert_eq!(m.get(b"new").unwrap(), b"data");
    assert!(m.get(b"old").is_none());
}

// -------------------- len / is_empty --------------------

#[test]
fn len_counts_tombstones() {
    let mut m = Memtable::new();
    m.set(b"a".to_vec(), b"1".to_vec());
    m.delete(b"b".to_vec());
    assert_eq!(m.len(), 2);
}

#[test]
fn is_empty_on_new() {
    let m = Memtable::new();
    assert!(m.is_empty());
}

#[test]
fn is_empty_after_insert() {
    let mut m = Memtable::new();
    m.set(b"k".to_vec(), b"v".to_vec());
    assert!(!m.is_empty());
}

#[test]
fn default_creates_empty() {
    let m = Memtable::default();
    assert!(m.is_empty());
    assert_eq!(m.approx_size(), 0);
}

// -------------------- Many / stress tests --------------------

#[test]
fn many_distinct_keys() {
    let mut m = Memtable::new();
    for i in 0u64..1000 {
        m.set(format!("key{:04}", i).into_bytes(), b"v".to_vec());
    }
    assert_eq!(m.len(), 1000);
    let keys: Vec<&[u8]> = m.entries().map(|(k, _)| k).collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[test]
fn overwrite_same_key_many_times() {
    let mut m = Memtable::new();
    for i in 1..=10_000u64 {
        m.set(b"k".to_vec(), format!("v{}", i).into_bytes());
    }
    assert_eq!(m.len(), 1);
    assert_eq!(m.get(b"k").unwrap(), b"v10000");
}

#[test]
fn alternating_set_delete() {
    let mut m = Memtable::new();
    for _ in 0..1_000u64 {
        m.set(b"k".to_vec(), b"v".to_vec());
        m.delete(b"k".to_vec());
    }
    assert!(m.get(b"k").is_none());
    assert_eq!(m.len(), 1);
}

// -------------------- Edge cases --------------------

#[test]
fn empty_key() {
    let mut m = Memtable::new();
    m.set(b"".to_vec(), b"val".to_vec());
    assert_eq!(m.get(b"").unwrap(), b"val");
}

#[test]
fn empty_value_reads_back_as_tombstone() {
    // The on-disk wire format cannot distinguish a zero-length live value
    // from a tombstone; the in-memory memtable itself has no such
    // limitation and stores it as a live entry.
    let mut m = Memtable::new();
    m.set(b"k".to_vec(), b"".to_vec());
    assert_eq!(m.get(b"k").unwrap(), b"".as_slice());
    assert!(m.get_entry(b"k").unwrap().value.is_some());
}

#[test]
fn binary_key_and_value() {
    let mut m = Memtable::new();
    let key = vec![0x00, 0xFF, 0x80, 0x01];
    let val = vec![0xDE, 0xAD, 0xBE, 0xEF];
    m.set(key.clone(), val.clone());
    assert_eq!(m.get(&key).unwrap(), val);
}

#[test]
fn large_value() {
    let mut m = Memtable::new();
    let val = vec![b'x'; 1_000_000]; // 1 MB
    m.set(b"big".to_vec(), val.clone());
    assert_eq!(m.get(b"big").unwrap().len(), 1_000_000);
    assert_eq!(m.approx_size(), 3 + 1_000_000); // key len (3) + value len
}

#[test]
fn approx_size_for_new_tombstone() {
    let mut m = Memtable::new();
    m.delete(b"key".to_vec()); // key=3, no value -> 3
    assert_eq!(m.approx_size(), 3);
}

#[test]
fn approx_size_multiple_keys() {
    let mut m = Memtable::new();
    m.set(b"a".to_vec(), b"1".to_vec()); // 1+1=2
    m.set(b"bb".to_vec(), b"22".to_vec()); // 2+2=4
    m.set(b"ccc".to_vec(), b"333".to_vec()); // 3+3=6
    assert_eq!(m.approx_size(), 12);
}

#[test]
fn delete_nonexistent_key_creates_tombstone() {
    let mut m = Memtable::new();
    m.delete(b"k".to_vec());
    assert_eq!(m.len(), 1);
    assert!(m.get(b"k").is_none());
    assert!(m.contains_key(b"k"));
}

#[test]
fn set_after_delete_resurrects_key() {
    let mut m = Memtable::new();
    m.set(b"k".to_vec(), b"v1".to_vec());
    m.delete(b"k".to_vec());
    assert!(m.get(b"k").is_none());

    m.set(b"k".to_vec(), b"v2".to_vec());
    assert_eq!(m.get(b"k").unwrap(), b"v2");
}

// -------------------- get_entry & tombstones --------------------

#[test]
fn get_entry_returns_tombstone() {
    let mut m = Memtable::new();
    m.delete(b"k".to_vec());
    let entry = m.get_entry(b"k").unwrap();
    assert!(entry.value.is_none());
}

#[test]
fn get_entry_returns_none_for_missing_key() {
    let m = Memtable::new();
    assert!(m.get_entry(b"nope").is_none());
}

#[test]
fn get_entry_returns_live_value() {
    let mut m = Memtable::new();
    m.set(b"k".to_vec(), b"v".to_vec());
    let entry = m.get_entry(b"k").unwrap();
    assert_eq!(entry.value.as_deref(), Some(b"v".as_slice()));
}

// -------------------- Clone --------------------

#[test]
fn clone_is_independent_snapshot() {
    let mut m = Memtable::new();
    m.set(b"a".to_vec(), b"1".to_vec());
    let snapshot = m.clone();

    m.set(b"a".to_vec(), b"2".to_vec());
    m.set(b"b".to_vec(), b"3".to_vec());

    assert_eq!(snapshot.get(b"a").unwrap(), b"1");
    assert!(snapshot.get(b"b").is_none());
    assert_eq!(snapshot.len(), 1);

    assert_eq!(m.get(b"a").unwrap(), b"2");
    assert_eq!(m.len(), 2);
}

#[test]
fn clone_preserves_approx_size() {
    let mut m = Memtable::new();
    m.set(b"a".to_vec(), b"1".to_vec());
    m.set(b"bb".to_vec(), b"22".to_vec());
    let snapshot = m.clone();
    assert_eq!(snapshot.approx_size(), m.approx_size());
}
