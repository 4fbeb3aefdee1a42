//! In-memory storage engine with snapshot-isolated transactions
//!
//! Implements the substrate with:
//! - `BTreeMap<Vec<u8>, Vec<u8>>` for ordered key storage
//! - `parking_lot::RwLock` for thread-safe access
//! - `AtomicU64` for a monotonically increasing commit version
//!
//! A transaction reads from a cloned snapshot taken at `begin()` and
//! buffers its writes; `commit()` publishes the buffer atomically
//! under the write lock. Dropping a transaction without committing
//! discards the buffer, which is what gives index mutations the same
//! abort semantics as the record write they ride on.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use quiver_core::Result;

use crate::Transaction;

/// Ordered in-memory storage backend
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<BTreeMap<Vec<u8>, Vec<u8>>>>,
    version: AtomicU64,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(BTreeMap::new())),
            version: AtomicU64::new(0),
        }
    }

    /// Begin a transaction against the current committed state
    pub fn begin(&self) -> MemoryTransaction {
        MemoryTransaction {
            data: Arc::clone(&self.data),
            snapshot: self.data.read().clone(),
            writes: BTreeMap::new(),
        }
    }

    /// Version of the last committed transaction
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Number of live keys in committed state
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the committed state is empty
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    fn commit_writes(&self, writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>) -> u64 {
        let mut data = self.data.write();
        let count = writes.len();
        for (key, value) in writes {
            match value {
                Some(v) => {
                    data.insert(key, v);
                }
                None => {
                    data.remove(&key);
                }
            }
        }
        let version = self.version.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(target: "quiver::storage", version, writes = count, "Transaction committed");
        version
    }
}

/// A snapshot-isolated transaction over [`MemoryStore`]
///
/// Writes are buffered as `key -> Some(value)` (put) or `key -> None`
/// (delete) and only become visible to other transactions at commit.
pub struct MemoryTransaction {
    data: Arc<RwLock<BTreeMap<Vec<u8>, Vec<u8>>>>,
    snapshot: BTreeMap<Vec<u8>, Vec<u8>>,
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl MemoryTransaction {
    /// Atomically publish buffered writes to the store
    pub fn commit(self, store: &MemoryStore) -> u64 {
        debug_assert!(Arc::ptr_eq(&self.data, &store.data), "commit against foreign store");
        store.commit_writes(self.writes)
    }

    /// Discard buffered writes explicitly (equivalent to dropping)
    pub fn rollback(self) {}
}

impl Transaction for MemoryTransaction {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if let Some(buffered) = self.writes.get(key) {
            return Ok(buffered.clone());
        }
        Ok(self.snapshot.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: Vec<u8>) -> Result<()> {
        self.writes.insert(key.to_vec(), Some(value));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.writes.insert(key.to_vec(), None);
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = self
            .snapshot
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        for (key, value) in self.writes.range(prefix.to_vec()..) {
            if !key.starts_with(prefix) {
                break;
            }
            match value {
                Some(v) => {
                    merged.insert(key.clone(), v.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        Ok(merged.into_iter().collect())
    }
}
