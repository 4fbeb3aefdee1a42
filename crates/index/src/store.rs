//! Persistent graph node store
//!
//! The graph is a cyclic structure, but no in-memory pointers exist
//! anywhere: every node reference is a `RecordId` resolved through
//! this store on demand, and the store routes through the caller's
//! transaction. Keyspace layout, per index:
//!
//! ```text
//! v/<index-name>/n/<record-id>   -> bincode(VectorNode)
//! v/<index-name>/e               -> bincode(EntryPoint)   (reserved singleton)
//! ```
//!
//! The entry-point key sorts outside the `n/` prefix, so node scans
//! never see it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use quiver_core::{Error, RecordId, Result};
use quiver_storage::Transaction;

/// One graph node per indexed record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorNode {
    /// The indexed embedding
    pub vector: Vec<f32>,
    /// Adjacency per level: neighbors[l] is the level-l neighbor set.
    /// BTreeSet keeps iteration deterministic.
    pub neighbors: Vec<BTreeSet<RecordId>>,
}

impl VectorNode {
    /// Create a node participating in levels 0..=level with empty adjacency
    pub fn new(vector: Vec<f32>, level: usize) -> Self {
        Self {
            vector,
            neighbors: (0..=level).map(|_| BTreeSet::new()).collect(),
        }
    }

    /// Highest level this node participates in
    pub fn max_level(&self) -> usize {
        self.neighbors.len().saturating_sub(1)
    }

    /// Neighbor set at a level, empty if the node does not reach it
    pub fn neighbors_at(&self, level: usize) -> Option<&BTreeSet<RecordId>> {
        self.neighbors.get(level)
    }
}

/// The reserved singleton naming where every descent starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryPoint {
    /// Current top-level entry node
    pub node_id: RecordId,
    /// Highest populated level in the graph
    pub top_level: usize,
}

/// Key mapping + codec for one index's keyspace
///
/// Stateless apart from the precomputed key prefixes; all data flows
/// through the transaction handed in per call.
#[derive(Debug, Clone)]
pub struct NodeStore {
    node_prefix: Vec<u8>,
    entry_key: Vec<u8>,
}

impl NodeStore {
    /// Create the store for the named index
    pub fn new(index_name: &str) -> Self {
        Self {
            node_prefix: format!("v/{}/n/", index_name).into_bytes(),
            entry_key: format!("v/{}/e", index_name).into_bytes(),
        }
    }

    fn node_key(&self, id: &RecordId) -> Vec<u8> {
        let mut key = self.node_prefix.clone();
        key.extend_from_slice(id.as_bytes());
        key
    }

    /// Load a node, None if absent
    pub fn get<T: Transaction>(&self, txn: &T, id: &RecordId) -> Result<Option<VectorNode>> {
        match txn.get(&self.node_key(id))? {
            Some(bytes) => {
                let node = bincode::deserialize(&bytes).map_err(|e| {
                    Error::Corruption(format!("undecodable node record for {}: {}", id, e))
                })?;
                Ok(Some(node))
            }
            None => Ok(None),
        }
    }

    /// Write (insert or overwrite) a node
    pub fn put<T: Transaction>(&self, txn: &mut T, id: &RecordId, node: &VectorNode) -> Result<()> {
        let bytes = bincode::serialize(node)?;
        txn.put(&self.node_key(id), bytes)
    }

    /// Remove a node record
    pub fn delete<T: Transaction>(&self, txn: &mut T, id: &RecordId) -> Result<()> {
        txn.delete(&self.node_key(id))
    }

    /// Load the entry point, None while the index is empty
    pub fn entry_point<T: Transaction>(&self, txn: &T) -> Result<Option<EntryPoint>> {
        match txn.get(&self.entry_key)? {
            Some(bytes) => {
                let ep = bincode::deserialize(&bytes).map_err(|e| {
                    Error::Corruption(format!("undecodable entry point record: {}", e))
                })?;
                Ok(Some(ep))
            }
            None => Ok(None),
        }
    }

    /// Replace the entry point
    pub fn set_entry_point<T: Transaction>(&self, txn: &mut T, ep: &EntryPoint) -> Result<()> {
        let bytes = bincode::serialize(ep)?;
        txn.put(&self.entry_key, bytes)
    }

    /// Clear the entry point (the index became empty)
    pub fn clear_entry_point<T: Transaction>(&self, txn: &mut T) -> Result<()> {
        txn.delete(&self.entry_key)
    }

    /// All nodes of this index, in id order (diagnostics and rebuild)
    pub fn scan<T: Transaction>(&self, txn: &T) -> Result<Vec<(RecordId, VectorNode)>> {
        let pairs = txn.scan_prefix(&self.node_prefix)?;
        let mut nodes = Vec::with_capacity(pairs.len());
        for (key, bytes) in pairs {
            let suffix = &key[self.node_prefix.len()..];
            let id = RecordId::new(String::from_utf8(suffix.to_vec()).map_err(|_| {
                Error::Corruption(format!("non-utf8 node key in index keyspace: {:?}", key))
            })?);
            let node = bincode::deserialize(&bytes).map_err(|e| {
                Error::Corruption(format!("undecodable node record for {}: {}", id, e))
            })?;
            nodes.push((id, node));
        }
        Ok(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiver_storage::MemoryStore;

    fn node(vector: Vec<f32>, level: usize) -> VectorNode {
        VectorNode::new(vector, level)
    }

    #[test]
    fn test_node_levels() {
        let n = node(vec![1.0], 2);
        assert_eq!(n.max_level(), 2);
        assert_eq!(n.neighbors.len(), 3);
        assert!(n.neighbors_at(2).unwrap().is_empty());
        assert!(n.neighbors_at(3).is_none());
    }

    #[test]
    fn test_put_get_roundtrip() {
        let store = NodeStore::new("emb");
        let db = MemoryStore::new();
        let mut txn = db.begin();

        let id = RecordId::new("rec-1");
        let mut n = node(vec![1.0, 2.0], 1);
        n.neighbors[0].insert(RecordId::new("rec-2"));

        store.put(&mut txn, &id, &n).unwrap();
        assert_eq!(store.get(&txn, &id).unwrap(), Some(n));
        assert_eq!(store.get(&txn, &RecordId::new("rec-9")).unwrap(), None);
    }

    #[test]
    fn test_entry_point_roundtrip() {
        let store = NodeStore::new("emb");
        let db = MemoryStore::new();
        let mut txn = db.begin();

        assert_eq!(store.entry_point(&txn).unwrap(), None);

        let ep = EntryPoint {
            node_id: RecordId::new("rec-1"),
            top_level: 3,
        };
        store.set_entry_point(&mut txn, &ep).unwrap();
        assert_eq!(store.entry_point(&txn).unwrap(), Some(ep));

        store.clear_entry_point(&mut txn).unwrap();
        assert_eq!(store.entry_point(&txn).unwrap(), None);
    }

    #[test]
    fn test_scan_excludes_entry_point_and_other_indexes() {
        let store = NodeStore::new("emb");
        let other = NodeStore::new("emb2");
        let db = MemoryStore::new();
        let mut txn = db.begin();

        store.put(&mut txn, &RecordId::new("b"), &node(vec![2.0], 0)).unwrap();
        store.put(&mut txn, &RecordId::new("a"), &node(vec![1.0], 0)).unwrap();
        store
            .set_entry_point(
                &mut txn,
                &EntryPoint {
                    node_id: RecordId::new("a"),
                    top_level: 0,
                },
            )
            .unwrap();
        other.put(&mut txn, &RecordId::new("z"), &node(vec![9.0], 0)).unwrap();

        let scanned = store.scan(&txn).unwrap();
        let ids: Vec<&str> = scanned.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_delete_node() {
        let store = NodeStore::new("emb");
        let db = MemoryStore::new();
        let mut txn = db.begin();

        let id = RecordId::new("rec-1");
        store.put(&mut txn, &id, &node(vec![1.0], 0)).unwrap();
        store.delete(&mut txn, &id).unwrap();
        assert_eq!(store.get(&txn, &id).unwrap(), None);
        // Idempotent at the storage level
        store.delete(&mut txn, &id).unwrap();
    }

    #[test]
    fn test_undecodable_node_is_corruption() {
        let store = NodeStore::new("emb");
        let db = MemoryStore::new();
        let mut txn = db.begin();

        let key = {
            let mut k = b"v/emb/n/".to_vec();
            k.extend_from_slice(b"bad");
            k
        };
        txn.put(&key, vec![0xFF, 0x01]).unwrap();

        let result = store.get(&txn, &RecordId::new("bad"));
        assert!(matches!(result, Err(Error::Corruption(_))));
    }
}
