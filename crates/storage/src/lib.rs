//! Transactional key-value substrate for Quiver
//!
//! The index subsystem never talks to storage directly; it routes
//! every read and write through the [`Transaction`] trait, which is
//! the boundary a production storage engine implements. This crate
//! also ships [`MemoryStore`], an ordered in-memory engine with
//! snapshot-isolated transactions, used by the test suite and by
//! embedders that do not bring their own engine.

pub mod memory;

pub use memory::{MemoryStore, MemoryTransaction};

use quiver_core::Result;

/// A transaction over the key-value substrate
///
/// Index operations participate in the caller's transaction: an
/// aborted record write discards index mutations along with it.
/// Implementations must provide read-your-writes semantics within a
/// single transaction, since graph repair reads back nodes it has
/// just rewritten.
pub trait Transaction {
    /// Point read. Returns None if the key is absent.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Point write (insert or overwrite).
    fn put(&mut self, key: &[u8], value: Vec<u8>) -> Result<()>;

    /// Point delete. Deleting an absent key is not an error.
    fn delete(&mut self, key: &[u8]) -> Result<()>;

    /// Ordered scan of all live pairs whose key starts with `prefix`.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;
}
