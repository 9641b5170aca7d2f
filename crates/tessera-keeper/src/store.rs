//! Keyed byte storage consumed from the host.
//!
//! The relay only needs get/set/has. `StoreOverlay` captures the writes of one
//! request so they can be applied all at once, or dropped if the request fails.

use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage backend failure: {reason}")]
    Backend { reason: String },

    #[error("Corrupt value under key {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// A batch of key-value writes, in key order.
pub type StoreWrites = Vec<(Vec<u8>, Vec<u8>)>;

/// Byte-oriented key-value storage provided by the host.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    fn has(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }

    /// Apply a batch of writes. Backends with native batches should override this
    /// so the batch lands atomically.
    fn apply(&mut self, writes: StoreWrites) -> Result<(), StoreError> {
        for (key, value) in writes {
            self.set(&key, &value)?;
        }
        Ok(())
    }
}

/// In-memory store, ordered by key.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.entries.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn has(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.entries.contains_key(key))
    }
}

/// Copy-on-write view over a base store.
///
/// Reads see the overlay's own writes first, then the base. Writes never reach
/// the base; `into_writes` hands them back for the caller to apply.
pub struct StoreOverlay<'a> {
    base: &'a dyn KvStore,
    writes: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl<'a> StoreOverlay<'a> {
    pub fn new(base: &'a dyn KvStore) -> Self {
        Self {
            base,
            writes: BTreeMap::new(),
        }
    }

    /// Consume the overlay, returning its writes in key order.
    pub fn into_writes(self) -> StoreWrites {
        self.writes.into_iter().collect()
    }
}

impl KvStore for StoreOverlay<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        match self.writes.get(key) {
            Some(value) => Ok(Some(value.clone())),
            None => self.base.get(key),
        }
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.writes.insert(key.to_vec(), value.to_vec());
        Ok(())
    }
}
