//! QuiverDB - Embedded database with approximate vector similarity indexing
//!
//! The facade crate re-exports the public surface of the workspace:
//! configuration and errors from `quiver-core`, the transactional
//! key-value substrate from `quiver-storage`, and the HNSW vector
//! index from `quiver-index`.
//!
//! # Quick Start
//!
//! ```
//! use quiverdb::{DistanceMetric, IndexConfig, MemoryStore, VectorIndex, VectorQuery};
//!
//! # fn main() -> quiverdb::Result<()> {
//! let store = MemoryStore::new();
//! let config = IndexConfig::new(3, DistanceMetric::Cosine)?;
//! let mut index = VectorIndex::new("embedding", config);
//!
//! let mut txn = store.begin();
//! index.on_attribute_write(&mut txn, &"rec:1".into(), &[0.1, 0.9, 0.2])?;
//! index.on_attribute_write(&mut txn, &"rec:2".into(), &[0.8, 0.1, 0.1])?;
//! txn.commit(&store);
//!
//! let txn = store.begin();
//! let nearest = index.search(&txn, &VectorQuery::new(vec![0.1, 1.0, 0.1], 1))?;
//! assert_eq!(nearest[0].id.as_str(), "rec:1");
//! # Ok(())
//! # }
//! ```

pub use quiver_core::{
    DistanceMetric, Error, IndexConfig, JsonScalar, MetadataFilter, RecordId, Result,
};
pub use quiver_index::{
    distance, parse_vector_target, Comparator, ConnectivityReport, Filter, GraphConfig, Neighbor,
    VectorIndex, VectorQuery,
};
pub use quiver_storage::{MemoryStore, MemoryTransaction, Transaction};
