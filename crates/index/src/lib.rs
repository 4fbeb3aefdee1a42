//! Quiver's approximate vector similarity index
//!
//! An HNSW (hierarchical navigable small world) proximity graph
//! persisted entirely through the key-value substrate: nodes and the
//! entry-point singleton are records, every traversal step resolves
//! neighbors through the caller's transaction, and nothing graph-shaped
//! lives in process memory between calls. The index therefore inherits
//! the substrate's transactional semantics: writes buffered in an
//! uncommitted transaction are visible to subsequent operations in
//! that transaction and discarded on rollback.
//!
//! [`VectorIndex`] is the single entry point; the internal engines
//! (insert, delete, search, validate) stay crate-private.

mod config;
mod delete;
mod distance;
mod insert;
mod level;
mod plan;
mod search;
mod store;
mod validate;

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info};

use quiver_core::{Error, IndexConfig, RecordId, Result};
use quiver_storage::Transaction;

pub use config::GraphConfig;
pub use distance::distance;
pub use plan::{parse_vector_target, Comparator};
pub use search::{Filter, Neighbor, VectorQuery};
pub use validate::ConnectivityReport;

use level::LevelSampler;
use search::Probe;
use store::NodeStore;

const DEFAULT_LEVEL_SEED: u64 = 42;

/// A named HNSW index over one vector attribute
///
/// Holds configuration and the deterministic level sampler; all graph
/// state lives behind the [`Transaction`] passed to each operation.
pub struct VectorIndex {
    name: String,
    config: IndexConfig,
    graph: GraphConfig,
    sampler: LevelSampler,
    store: NodeStore,
    /// Total nodes visited across all searches on this handle
    visited: AtomicU64,
}

impl VectorIndex {
    /// Index with default graph parameters (m = 16)
    pub fn new(name: impl Into<String>, config: IndexConfig) -> Self {
        Self::with_graph_config(name, config, GraphConfig::default())
    }

    /// Index with explicit graph parameters
    pub fn with_graph_config(
        name: impl Into<String>,
        config: IndexConfig,
        graph: GraphConfig,
    ) -> Self {
        let name = name.into();
        let store = NodeStore::new(&name);
        Self {
            name,
            config,
            graph,
            sampler: LevelSampler::new(DEFAULT_LEVEL_SEED),
            store,
            visited: AtomicU64::new(0),
        }
    }

    /// Replace the level sampler's seed (test determinism)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.sampler = LevelSampler::new(seed);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn graph_config(&self) -> &GraphConfig {
        &self.graph
    }

    /// Index a vector attribute value for `id`
    ///
    /// An existing node for the same id is replaced (delete, then
    /// insert); writing an identical vector is a no-op.
    pub fn on_attribute_write<T: Transaction>(
        &mut self,
        txn: &mut T,
        id: &RecordId,
        vector: &[f32],
    ) -> Result<()> {
        if vector.is_empty() {
            return Err(Error::EmptyVector {
                attribute: self.name.clone(),
            });
        }
        if vector.len() != self.config.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.config.dimension,
                got: vector.len(),
            });
        }

        if let Some(existing) = self.store.get(txn, id)? {
            if existing.vector == vector {
                return Ok(());
            }
            delete::delete(&self.store, txn, &self.config, &self.graph, id)?;
        }

        let mut probe = Probe::default();
        insert::insert(
            &self.store,
            txn,
            &self.config,
            &self.graph,
            &mut self.sampler,
            &mut probe,
            id,
            vector,
        )?;
        debug!(
            target: "quiver::vector",
            index = %self.name,
            node = %id,
            visited = probe.visited,
            "vector indexed"
        );
        Ok(())
    }

    /// Remove the node for `id`, repairing neighbors left
    /// under-connected. Returns `false` when no node existed.
    pub fn on_record_delete<T: Transaction>(
        &mut self,
        txn: &mut T,
        id: &RecordId,
    ) -> Result<bool> {
        let removed = delete::delete(&self.store, txn, &self.config, &self.graph, id)?;
        if removed {
            debug!(target: "quiver::vector", index = %self.name, node = %id, "vector removed");
        }
        Ok(removed)
    }

    /// Top-k nearest-neighbor search
    pub fn search<T: Transaction>(
        &self,
        txn: &T,
        query: &VectorQuery,
    ) -> Result<Vec<Neighbor>> {
        self.search_filtered(txn, query, None)
    }

    /// Top-k search with a record-level predicate
    ///
    /// Nodes failing the predicate are traversed (the graph stays
    /// navigable through them) but never returned, so a selective
    /// filter cannot strand the search.
    pub fn search_filtered<T: Transaction>(
        &self,
        txn: &T,
        query: &VectorQuery,
        filter: Option<&Filter<'_>>,
    ) -> Result<Vec<Neighbor>> {
        let mut probe = Probe::default();
        let results = search::search(
            &self.store,
            txn,
            &self.config,
            &self.graph,
            query,
            filter,
            &mut probe,
        )?;
        self.visited.fetch_add(probe.visited, Ordering::Relaxed);
        Ok(results)
    }

    /// Cumulative nodes visited by searches on this handle
    pub fn nodes_visited(&self) -> u64 {
        self.visited.load(Ordering::Relaxed)
    }

    /// Full-graph connectivity sweep; damage is reported, not raised
    pub fn validate<T: Transaction>(&self, txn: &T) -> Result<ConnectivityReport> {
        validate::validate(&self.store, txn)
    }

    /// Connectivity sweep that treats disconnection as corruption
    pub fn validate_strict<T: Transaction>(&self, txn: &T) -> Result<ConnectivityReport> {
        let report = validate::validate(&self.store, txn)?;
        validate::assert_connected(&report)?;
        Ok(report)
    }

    /// Number of indexed vectors
    pub fn len<T: Transaction>(&self, txn: &T) -> Result<usize> {
        Ok(self.store.scan(txn)?.len())
    }

    pub fn is_empty<T: Transaction>(&self, txn: &T) -> Result<bool> {
        Ok(self.len(txn)? == 0)
    }

    /// Drop the whole graph and re-insert every vector in id order
    ///
    /// Recovers from accumulated structural damage (a fresh build has
    /// no asymmetric links or isolated nodes). Returns the number of
    /// vectors reindexed.
    pub fn rebuild<T: Transaction>(&mut self, txn: &mut T) -> Result<usize> {
        let nodes = self.store.scan(txn)?;
        for (id, _) in &nodes {
            self.store.delete(txn, id)?;
        }
        self.store.clear_entry_point(txn)?;

        let mut probe = Probe::default();
        for (id, node) in &nodes {
            insert::insert(
                &self.store,
                txn,
                &self.config,
                &self.graph,
                &mut self.sampler,
                &mut probe,
                id,
                &node.vector,
            )?;
        }
        info!(
            target: "quiver::vector",
            index = %self.name,
            count = nodes.len(),
            visited = probe.visited,
            "index rebuilt"
        );
        Ok(nodes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiver_core::DistanceMetric;
    use quiver_storage::MemoryStore;

    fn index(dimension: usize) -> VectorIndex {
        let config =
            IndexConfig::new(dimension, DistanceMetric::Euclidean).expect("valid dimension");
        VectorIndex::with_graph_config("embedding", config, GraphConfig::new(8)).with_seed(7)
    }

    fn id(n: usize) -> RecordId {
        RecordId::new(format!("rec:{n:04}"))
    }

    #[test]
    fn test_empty_index_search_returns_nothing() {
        let store = MemoryStore::new();
        let idx = index(3);
        let txn = store.begin();
        let results = idx
            .search(&txn, &VectorQuery::new(vec![1.0, 0.0, 0.0], 5))
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_missing_target_is_rejected() {
        let store = MemoryStore::new();
        let idx = index(3);
        let txn = store.begin();
        let query = VectorQuery {
            target: None,
            k: 5,
            ef: None,
        };
        let err = idx.search(&txn, &query).unwrap_err();
        assert_eq!(err.to_string(), "target vector must be provided");
    }

    #[test]
    fn test_write_validates_dimension() {
        let store = MemoryStore::new();
        let mut idx = index(3);
        let mut txn = store.begin();
        let err = idx
            .on_attribute_write(&mut txn, &id(0), &[1.0, 2.0])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 3,
                got: 2
            }
        ));

        let err = idx.on_attribute_write(&mut txn, &id(0), &[]).unwrap_err();
        assert!(matches!(err, Error::EmptyVector { .. }));
    }

    #[test]
    fn test_single_node_round_trip() {
        let store = MemoryStore::new();
        let mut idx = index(3);
        let mut txn = store.begin();
        idx.on_attribute_write(&mut txn, &id(0), &[1.0, 2.0, 3.0])
            .unwrap();

        let results = idx
            .search(&txn, &VectorQuery::new(vec![1.0, 2.0, 3.0], 1))
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, id(0));
        assert!(results[0].distance < 1e-6);
        assert_eq!(idx.len(&txn).unwrap(), 1);
    }

    #[test]
    fn test_rewrite_same_vector_is_noop() {
        let store = MemoryStore::new();
        let mut idx = index(3);
        let mut txn = store.begin();
        idx.on_attribute_write(&mut txn, &id(0), &[1.0, 2.0, 3.0])
            .unwrap();
        idx.on_attribute_write(&mut txn, &id(0), &[1.0, 2.0, 3.0])
            .unwrap();
        assert_eq!(idx.len(&txn).unwrap(), 1);
    }

    #[test]
    fn test_rewrite_replaces_vector() {
        let store = MemoryStore::new();
        let mut idx = index(3);
        let mut txn = store.begin();
        idx.on_attribute_write(&mut txn, &id(0), &[1.0, 0.0, 0.0])
            .unwrap();
        idx.on_attribute_write(&mut txn, &id(1), &[0.0, 1.0, 0.0])
            .unwrap();
        idx.on_attribute_write(&mut txn, &id(0), &[0.0, 0.0, 1.0])
            .unwrap();

        let results = idx
            .search(&txn, &VectorQuery::new(vec![0.0, 0.0, 1.0], 1))
            .unwrap();
        assert_eq!(results[0].id, id(0));
        assert!(results[0].distance < 1e-6);
        assert_eq!(idx.len(&txn).unwrap(), 2);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        let mut idx = index(3);
        let mut txn = store.begin();
        idx.on_attribute_write(&mut txn, &id(0), &[1.0, 2.0, 3.0])
            .unwrap();

        assert!(idx.on_record_delete(&mut txn, &id(0)).unwrap());
        assert!(!idx.on_record_delete(&mut txn, &id(0)).unwrap());
        assert!(idx.is_empty(&txn).unwrap());
    }

    #[test]
    fn test_delete_last_node_clears_entry_point() {
        let store = MemoryStore::new();
        let mut idx = index(3);
        let mut txn = store.begin();
        idx.on_attribute_write(&mut txn, &id(0), &[1.0, 2.0, 3.0])
            .unwrap();
        idx.on_record_delete(&mut txn, &id(0)).unwrap();

        // A fresh insert must succeed as the first node again.
        idx.on_attribute_write(&mut txn, &id(1), &[3.0, 2.0, 1.0])
            .unwrap();
        let results = idx
            .search(&txn, &VectorQuery::new(vec![3.0, 2.0, 1.0], 1))
            .unwrap();
        assert_eq!(results[0].id, id(1));
    }

    #[test]
    fn test_search_counts_visited_nodes() {
        let store = MemoryStore::new();
        let mut idx = index(2);
        let mut txn = store.begin();
        for n in 0..20 {
            idx.on_attribute_write(&mut txn, &id(n), &[n as f32, (n * n) as f32])
                .unwrap();
        }
        assert_eq!(idx.nodes_visited(), 0);
        idx.search(&txn, &VectorQuery::new(vec![5.0, 25.0], 3))
            .unwrap();
        assert!(idx.nodes_visited() > 0);
    }

    #[test]
    fn test_filtered_search_excludes_but_still_navigates() {
        let store = MemoryStore::new();
        let mut idx = index(2);
        let mut txn = store.begin();
        for n in 0..30 {
            idx.on_attribute_write(&mut txn, &id(n), &[n as f32, 1.0])
                .unwrap();
        }

        // Exclude even ids; the nearest admitted neighbors must all be odd.
        let filter = |record: &RecordId| {
            let n: usize = record.as_str()["rec:".len()..].parse().unwrap();
            n % 2 == 1
        };
        let results = idx
            .search_filtered(
                &txn,
                &VectorQuery::new(vec![10.0, 1.0], 5).with_ef(30),
                Some(&filter),
            )
            .unwrap();
        assert_eq!(results.len(), 5);
        for neighbor in &results {
            let n: usize = neighbor.id.as_str()["rec:".len()..].parse().unwrap();
            assert_eq!(n % 2, 1, "even id {n} leaked through the filter");
        }
    }

    #[test]
    fn test_validate_empty_graph() {
        let store = MemoryStore::new();
        let idx = index(3);
        let txn = store.begin();
        let report = idx.validate(&txn).unwrap();
        assert!(report.is_fully_connected);
        assert!(report.isolated.is_empty());
    }

    #[test]
    fn test_validate_after_inserts_and_deletes() {
        let store = MemoryStore::new();
        let mut idx = index(2);
        let mut txn = store.begin();
        for n in 0..40 {
            idx.on_attribute_write(&mut txn, &id(n), &[n as f32, ((n * 7) % 11) as f32])
                .unwrap();
        }
        for n in 0..20 {
            idx.on_record_delete(&mut txn, &id(n)).unwrap();
        }

        let report = idx.validate_strict(&txn).unwrap();
        assert!(report.is_fully_connected);
        assert_eq!(idx.len(&txn).unwrap(), 20);
    }

    #[test]
    fn test_random_vectors_exact_under_wide_beam() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(11);
        let store = MemoryStore::new();
        let mut idx = index(4);
        let mut txn = store.begin();

        let mut vectors = Vec::new();
        for n in 0..50 {
            let v: Vec<f32> = (0..4).map(|_| rng.gen_range(-1.0f32..1.0)).collect();
            idx.on_attribute_write(&mut txn, &id(n), &v).unwrap();
            vectors.push(v);
        }

        // A beam covering the whole graph makes the search exact.
        let target: Vec<f32> = (0..4).map(|_| rng.gen_range(-1.0f32..1.0)).collect();
        let results = idx
            .search(&txn, &VectorQuery::new(target.clone(), 5).with_ef(50))
            .unwrap();
        assert_eq!(results.len(), 5);

        let nearest = vectors
            .iter()
            .enumerate()
            .map(|(n, v)| {
                (
                    distance(v, &target, DistanceMetric::Euclidean).unwrap(),
                    n,
                )
            })
            .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap())
            .unwrap();
        assert_eq!(results[0].id, id(nearest.1));
    }

    #[test]
    fn test_rebuild_preserves_contents() {
        let store = MemoryStore::new();
        let mut idx = index(2);
        let mut txn = store.begin();
        for n in 0..25 {
            idx.on_attribute_write(&mut txn, &id(n), &[n as f32, (25 - n) as f32])
                .unwrap();
        }
        let before = idx
            .search(&txn, &VectorQuery::new(vec![12.0, 13.0], 5))
            .unwrap();

        let count = idx.rebuild(&mut txn).unwrap();
        assert_eq!(count, 25);

        let report = idx.validate_strict(&txn).unwrap();
        assert_eq!(report.asymmetric_links, 0);
        let after = idx
            .search(&txn, &VectorQuery::new(vec![12.0, 13.0], 5))
            .unwrap();
        assert_eq!(
            before.iter().map(|n| &n.id).collect::<Vec<_>>(),
            after.iter().map(|n| &n.id).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_uncommitted_writes_visible_then_discarded() {
        let store = MemoryStore::new();
        let mut idx = index(3);

        let mut txn = store.begin();
        idx.on_attribute_write(&mut txn, &id(0), &[1.0, 2.0, 3.0])
            .unwrap();
        assert_eq!(idx.len(&txn).unwrap(), 1);
        txn.rollback();

        let txn = store.begin();
        assert!(idx.is_empty(&txn).unwrap());
    }
}
