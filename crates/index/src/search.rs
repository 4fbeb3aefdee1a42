//! Search engine: greedy descent plus bounded beam search
//!
//! The two traversal primitives here (`greedy_descent`, `search_layer`)
//! are shared with the insertion and deletion engines; the public
//! `search` operation composes them for top-k queries.
//!
//! Heap discipline: candidates sit in a min-heap (closest popped first
//! for expansion), admitted results in a max-heap (worst on top for
//! O(1) eviction). Ties break on RecordId ascending so results are
//! deterministic.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeSet, BinaryHeap, HashMap};

use serde::Serialize;

use quiver_core::{DistanceMetric, Error, IndexConfig, RecordId, Result};
use quiver_storage::Transaction;

use crate::config::GraphConfig;
use crate::distance::distance;
use crate::store::NodeStore;

/// Optional per-candidate predicate supplied by the query layer
pub type Filter<'a> = dyn Fn(&RecordId) -> bool + 'a;

/// A top-k query against the index
#[derive(Debug, Clone)]
pub struct VectorQuery {
    /// Target vector; required, validated at the API boundary
    pub target: Option<Vec<f32>>,
    /// Result count
    pub k: usize,
    /// Candidate-list width; defaults to the graph config's ef_search,
    /// and is never allowed below k
    pub ef: Option<usize>,
}

impl VectorQuery {
    /// Query for the k nearest neighbors of `target`
    pub fn new(target: Vec<f32>, k: usize) -> Self {
        Self {
            target: Some(target),
            k,
            ef: None,
        }
    }

    /// Override the candidate-list width
    pub fn with_ef(mut self, ef: usize) -> Self {
        self.ef = Some(ef);
        self
    }
}

/// One search result, distance attached (the `$distance` field the
/// query layer exposes)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighbor {
    /// Owning record's primary key
    pub id: RecordId,
    /// Distance to the query target under the index's metric
    pub distance: f64,
}

/// Scored candidate; orders by (distance asc, id asc)
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Scored {
    pub dist: f64,
    pub id: RecordId,
}

impl Eq for Scored {}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scored {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .partial_cmp(&other.dist)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Traversal cost accumulator (search observability, not control flow)
#[derive(Debug, Default)]
pub(crate) struct Probe {
    /// Nodes whose distance was evaluated during descent or expansion
    pub visited: u64,
}

/// Greedy 1-nearest descent from `from_level` down to `to_level`
///
/// At each level, repeatedly moves to the globally best neighbor until
/// none improves, then carries the best node into the next level down.
pub(crate) fn greedy_descent<T: Transaction>(
    store: &NodeStore,
    txn: &T,
    metric: DistanceMetric,
    target: &[f32],
    mut current: Scored,
    from_level: usize,
    to_level: usize,
    probe: &mut Probe,
) -> Result<Scored> {
    for level in (to_level..=from_level).rev() {
        loop {
            let Some(node) = store.get(txn, &current.id)? else {
                break;
            };
            let mut best = current.clone();

            for neighbor_id in node.neighbors_at(level).into_iter().flatten() {
                let Some(neighbor) = store.get(txn, neighbor_id)? else {
                    continue;
                };
                probe.visited += 1;
                let dist = distance(target, &neighbor.vector, metric)?;
                if dist < best.dist || (dist == best.dist && *neighbor_id < best.id) {
                    best = Scored {
                        dist,
                        id: neighbor_id.clone(),
                    };
                }
            }

            if best.id == current.id {
                break;
            }
            current = best;
        }
    }
    Ok(current)
}

/// Bounded beam search at a single level
///
/// Returns up to `ef` admitted candidates sorted ascending by
/// (distance, id). Candidates failing `filter` are expanded but never
/// admitted, so filtering cannot sever the traversal.
pub(crate) fn search_layer<T: Transaction>(
    store: &NodeStore,
    txn: &T,
    metric: DistanceMetric,
    target: &[f32],
    entry: Scored,
    ef: usize,
    level: usize,
    filter: Option<&Filter<'_>>,
    probe: &mut Probe,
) -> Result<Vec<Scored>> {
    let mut visited: BTreeSet<RecordId> = BTreeSet::new();
    visited.insert(entry.id.clone());

    // Nodes already loaded this traversal; a popped candidate's
    // adjacency is needed after its distance was computed.
    let mut loaded: HashMap<RecordId, crate::store::VectorNode> = HashMap::new();

    let mut candidates: BinaryHeap<Reverse<Scored>> = BinaryHeap::new();
    candidates.push(Reverse(entry.clone()));

    let mut results: BinaryHeap<Scored> = BinaryHeap::new();
    if filter.map_or(true, |f| f(&entry.id)) {
        results.push(entry);
    }

    while let Some(Reverse(nearest)) = candidates.pop() {
        let worst = results.peek().map(|s| s.dist).unwrap_or(f64::INFINITY);
        if results.len() >= ef && nearest.dist > worst {
            break;
        }

        let node = match loaded.get(&nearest.id) {
            Some(node) => node.clone(),
            None => match store.get(txn, &nearest.id)? {
                Some(node) => node,
                None => continue,
            },
        };

        for neighbor_id in node.neighbors_at(level).into_iter().flatten() {
            if visited.contains(neighbor_id) {
                continue;
            }
            visited.insert(neighbor_id.clone());

            let Some(neighbor) = store.get(txn, neighbor_id)? else {
                continue;
            };
            probe.visited += 1;
            let dist = distance(target, &neighbor.vector, metric)?;
            loaded.insert(neighbor_id.clone(), neighbor);

            let worst = results.peek().map(|s| s.dist).unwrap_or(f64::INFINITY);
            if results.len() < ef || dist < worst {
                let scored = Scored {
                    dist,
                    id: neighbor_id.clone(),
                };
                candidates.push(Reverse(scored.clone()));

                if filter.map_or(true, |f| f(neighbor_id)) {
                    results.push(scored);
                    if results.len() > ef {
                        results.pop();
                    }
                }
            }
        }
    }

    let mut out: Vec<Scored> = results.into_vec();
    out.sort();
    Ok(out)
}

/// Top-k nearest-neighbor search
pub(crate) fn search<T: Transaction>(
    store: &NodeStore,
    txn: &T,
    config: &IndexConfig,
    graph: &GraphConfig,
    query: &VectorQuery,
    filter: Option<&Filter<'_>>,
    probe: &mut Probe,
) -> Result<Vec<Neighbor>> {
    let target = query.target.as_deref().ok_or(Error::MissingTargetVector)?;
    if target.len() != config.dimension {
        return Err(Error::DimensionMismatch {
            expected: config.dimension,
            got: target.len(),
        });
    }
    if query.k == 0 {
        return Ok(Vec::new());
    }

    let Some(ep) = store.entry_point(txn)? else {
        return Ok(Vec::new());
    };
    let Some(entry_node) = store.get(txn, &ep.node_id)? else {
        return Err(Error::Corruption(format!(
            "entry point references missing node {}",
            ep.node_id
        )));
    };

    probe.visited += 1;
    let mut entry = Scored {
        dist: distance(target, &entry_node.vector, config.metric)?,
        id: ep.node_id,
    };

    if ep.top_level > 0 {
        entry = greedy_descent(
            store,
            txn,
            config.metric,
            target,
            entry,
            ep.top_level,
            1,
            probe,
        )?;
    }

    let ef = query.ef.unwrap_or(graph.ef_search).max(query.k);
    let admitted = search_layer(
        store,
        txn,
        config.metric,
        target,
        entry,
        ef,
        0,
        filter,
        probe,
    )?;

    Ok(admitted
        .into_iter()
        .take(query.k)
        .map(|s| Neighbor {
            id: s.id,
            distance: s.dist,
        })
        .collect())
}
