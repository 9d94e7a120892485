//! Prefixed key-value store abstraction
//!
//! All engine state lives in a byte-keyed ordered store. [`MemoryStore`] is
//! the backing store used by hosts and tests; [`CacheStore`] layers pending
//! writes on top of any other store so a message can be applied atomically and
//! either committed or dropped.

use crate::codec;
use crate::errors::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

/// Ordered byte-keyed store
pub trait KvStore {
    /// Value stored under `key`
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Whether `key` is present
    fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Insert or overwrite `key`
    fn set(&mut self, key: &[u8], value: Vec<u8>);

    /// Remove `key` if present
    fn delete(&mut self, key: &[u8]);

    /// All entries whose key starts with `prefix`, in ascending key order
    fn prefix_scan(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)>;
}

/// In-memory ordered store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn has(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) {
        self.entries.insert(key.to_vec(), value);
    }

    fn delete(&mut self, key: &[u8]) {
        self.entries.remove(key);
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.entries
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// Write overlay on top of a parent store
///
/// Reads see pending writes first. Nothing reaches the parent until
/// [`CacheStore::commit`]; dropping the cache discards every pending write.
pub struct CacheStore<'a> {
    parent: &'a mut dyn KvStore,
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> CacheStore<'a> {
    /// Overlay on `parent`
    pub fn new(parent: &'a mut dyn KvStore) -> Self {
        Self {
            parent,
            writes: BTreeMap::new(),
        }
    }

    /// Number of pending writes and deletes
    pub fn pending(&self) -> usize {
        self.writes.len()
    }

    /// Flush pending writes into the parent
    pub fn commit(self) {
        let Self { parent, writes } = self;
        for (key, value) in writes {
            match value {
                Some(value) => parent.set(&key, value),
                None => parent.delete(&key),
            }
        }
    }
}

impl KvStore for CacheStore<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.writes.get(key) {
            Some(pending) => pending.clone(),
            None => self.parent.get(key),
        }
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) {
        self.writes.insert(key.to_vec(), Some(value));
    }

    fn delete(&mut self, key: &[u8]) {
        self.writes.insert(key.to_vec(), None);
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.parent.prefix_scan(prefix).into_iter().collect();
        for (key, pending) in self
            .writes
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
        {
            match pending {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        merged.into_iter().collect()
    }
}

/// Decode the value stored under `key`
pub fn get_value<T: DeserializeOwned>(store: &dyn KvStore, key: &[u8]) -> Result<Option<T>> {
    store
        .get(key)
        .map(|bytes| codec::from_slice(&bytes))
        .transpose()
}

/// Encode and store `value` under `key`
pub fn set_value<T: Serialize>(store: &mut dyn KvStore, key: &[u8], value: &T) -> Result<()> {
    let bytes = codec::to_vec(value)?;
    store.set(key, bytes);
    Ok(())
}

/// Decode every value under `prefix`
pub fn scan_values<T: DeserializeOwned>(store: &dyn KvStore, prefix: &[u8]) -> Result<Vec<T>> {
    store
        .prefix_scan(prefix)
        .into_iter()
        .map(|(_, bytes)| codec::from_slice(&bytes))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.set(b"a/1", b"one".to_vec());
        store.set(b"a/2", b"two".to_vec());
        store.set(b"b/1", b"other".to_vec());
        store
    }

    #[test]
    fn test_prefix_scan_is_ordered_and_bounded() {
        let store = seeded();
        let keys: Vec<Vec<u8>> = store.prefix_scan(b"a/").into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![b"a/1".to_vec(), b"a/2".to_vec()]);
    }

    #[test]
    fn test_cache_reads_through_and_shadows() {
        let mut store = seeded();
        let mut cache = CacheStore::new(&mut store);
        assert_eq!(cache.get(b"a/1"), Some(b"one".to_vec()));

        cache.set(b"a/3", b"three".to_vec());
        cache.delete(b"a/1");
        assert_eq!(cache.get(b"a/1"), None);

        let keys: Vec<Vec<u8>> = cache.prefix_scan(b"a/").into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![b"a/2".to_vec(), b"a/3".to_vec()]);
    }

    #[test]
    fn test_cache_commit_and_discard() {
        let mut store = seeded();
        {
            let mut cache = CacheStore::new(&mut store);
            cache.delete(b"a/1");
        }
        assert!(store.has(b"a/1"));

        let mut cache = CacheStore::new(&mut store);
        cache.delete(b"a/1");
        cache.set(b"c", b"new".to_vec());
        cache.commit();
        assert!(!store.has(b"a/1"));
        assert_eq!(store.get(b"c"), Some(b"new".to_vec()));
    }

    #[test]
    fn test_nested_cache() {
        let mut store = seeded();
        let mut outer = CacheStore::new(&mut store);
        {
            let mut inner = CacheStore::new(&mut outer);
            inner.set(b"a/9", b"nine".to_vec());
            inner.commit();
        }
        assert!(outer.has(b"a/9"));
        outer.commit();
        assert!(store.has(b"a/9"));
    }

    #[test]
    fn test_typed_values() {
        let mut store = MemoryStore::new();
        set_value(&mut store, b"n", &42u64).unwrap();
        assert_eq!(get_value::<u64>(&store, b"n").unwrap(), Some(42));
        assert_eq!(get_value::<u64>(&store, b"missing").unwrap(), None);
    }
}
