//! Insertion engine
//!
//! Adds one node: samples a level, greedily descends the existing
//! levels to find an entry, builds neighbor lists level-by-level from
//! beam-search candidates through the diversified selection heuristic,
//! and installs symmetric links.
//!
//! Edge mutations go through `link`/`shrink`, which keep adjacency
//! symmetric: pruning an edge removes its reverse as well. Deletion
//! relies on this invariant to find every back-reference through the
//! deleted node's own adjacency.

use std::collections::BTreeSet;

use tracing::warn;

use quiver_core::{DistanceMetric, Error, IndexConfig, RecordId, Result};
use quiver_storage::Transaction;

use crate::config::GraphConfig;
use crate::distance::distance;
use crate::level::LevelSampler;
use crate::search::{greedy_descent, search_layer, Probe, Scored};
use crate::store::{EntryPoint, NodeStore, VectorNode};

/// Diversified neighbor selection
///
/// Walks `candidates` nearest-first and keeps a candidate only if it
/// is closer to the base point than to every neighbor already kept,
/// which spreads edges across directions instead of clustering them.
/// When the heuristic under-fills the list and `extend_candidates` is
/// set, the nearest rejected candidates backfill up to `bound`.
///
/// `candidates` must be sorted ascending by distance to the base point.
pub(crate) fn select_neighbors<T: Transaction>(
    store: &NodeStore,
    txn: &T,
    graph: &GraphConfig,
    metric: DistanceMetric,
    candidates: &[Scored],
    bound: usize,
) -> Result<Vec<Scored>> {
    let mut selected: Vec<(Scored, Vec<f32>)> = Vec::new();
    let mut rejected: Vec<Scored> = Vec::new();

    for candidate in candidates {
        if selected.len() >= bound {
            break;
        }
        let Some(node) = store.get(txn, &candidate.id)? else {
            continue;
        };

        let mut diverse = true;
        for (_, kept_vector) in &selected {
            let to_kept = distance(&node.vector, kept_vector, metric)?;
            if to_kept <= candidate.dist {
                diverse = false;
                break;
            }
        }

        if diverse {
            selected.push((candidate.clone(), node.vector));
        } else {
            rejected.push(candidate.clone());
        }
    }

    let mut out: Vec<Scored> = selected.into_iter().map(|(s, _)| s).collect();
    if graph.extend_candidates {
        for candidate in rejected {
            if out.len() >= bound {
                break;
            }
            out.push(candidate);
        }
        out.sort();
    }
    Ok(out)
}

/// Install the symmetric edge pair a<->b at `layer`, shrinking either
/// endpoint that overflows its fan-out bound
pub(crate) fn link<T: Transaction>(
    store: &NodeStore,
    txn: &mut T,
    graph: &GraphConfig,
    metric: DistanceMetric,
    a: &RecordId,
    b: &RecordId,
    layer: usize,
) -> Result<()> {
    if a == b {
        return Ok(());
    }
    let (Some(mut node_a), Some(mut node_b)) = (store.get(txn, a)?, store.get(txn, b)?) else {
        warn!(target: "quiver::vector", from = %a, to = %b, layer, "link endpoint missing");
        return Ok(());
    };
    if layer >= node_a.neighbors.len() || layer >= node_b.neighbors.len() {
        warn!(
            target: "quiver::vector",
            from = %a,
            to = %b,
            layer,
            "link endpoint does not reach level"
        );
        return Ok(());
    }

    node_a.neighbors[layer].insert(b.clone());
    node_b.neighbors[layer].insert(a.clone());
    store.put(txn, a, &node_a)?;
    store.put(txn, b, &node_b)?;

    let bound = graph.max_connections(layer);
    for id in [a, b] {
        // Reload: shrinking one endpoint can rewrite the other.
        let Some(node) = store.get(txn, id)? else {
            continue;
        };
        if node.neighbors_at(layer).map_or(false, |set| set.len() > bound) {
            shrink(store, txn, graph, metric, id, layer, bound)?;
        }
    }
    Ok(())
}

/// Re-run the selection heuristic over a node's adjacency at one
/// level, shrinking it to `bound` and removing the reverse edge of
/// every pruned link
fn shrink<T: Transaction>(
    store: &NodeStore,
    txn: &mut T,
    graph: &GraphConfig,
    metric: DistanceMetric,
    id: &RecordId,
    layer: usize,
    bound: usize,
) -> Result<()> {
    let Some(mut node) = store.get(txn, id)? else {
        return Ok(());
    };
    let Some(adjacency) = node.neighbors_at(layer) else {
        return Ok(());
    };

    let mut scored = Vec::with_capacity(adjacency.len());
    for neighbor_id in adjacency {
        let Some(neighbor) = store.get(txn, neighbor_id)? else {
            continue;
        };
        scored.push(Scored {
            dist: distance(&node.vector, &neighbor.vector, metric)?,
            id: neighbor_id.clone(),
        });
    }
    scored.sort();

    let keep = select_neighbors(store, txn, graph, metric, &scored, bound)?;
    let kept: BTreeSet<RecordId> = keep.into_iter().map(|s| s.id).collect();

    for dropped in node.neighbors[layer].difference(&kept) {
        let Some(mut other) = store.get(txn, dropped)? else {
            continue;
        };
        if layer < other.neighbors.len() {
            other.neighbors[layer].remove(id);
            store.put(txn, dropped, &other)?;
        }
    }

    node.neighbors[layer] = kept;
    store.put(txn, id, &node)
}

/// Insert a node for `id` with the given (already validated) vector
///
/// The caller guarantees `id` has no existing node; updates route
/// through deletion first at the facade.
pub(crate) fn insert<T: Transaction>(
    store: &NodeStore,
    txn: &mut T,
    config: &IndexConfig,
    graph: &GraphConfig,
    sampler: &mut LevelSampler,
    probe: &mut Probe,
    id: &RecordId,
    vector: &[f32],
) -> Result<()> {
    debug_assert_eq!(vector.len(), config.dimension);

    // First node: single level, becomes the entry point.
    let Some(ep) = store.entry_point(txn)? else {
        store.put(txn, id, &VectorNode::new(vector.to_vec(), 0))?;
        store.set_entry_point(
            txn,
            &EntryPoint {
                node_id: id.clone(),
                top_level: 0,
            },
        )?;
        return Ok(());
    };

    let level = sampler.sample(graph.ml);
    // Persist the record before linking so edge installation and
    // pruning can resolve this vector through the store.
    store.put(txn, id, &VectorNode::new(vector.to_vec(), level))?;

    let Some(entry_node) = store.get(txn, &ep.node_id)? else {
        return Err(Error::Corruption(format!(
            "entry point references missing node {}",
            ep.node_id
        )));
    };
    probe.visited += 1;
    let mut entry = Scored {
        dist: distance(vector, &entry_node.vector, config.metric)?,
        id: ep.node_id.clone(),
    };

    // Locate an entry for the node's top level without linking yet.
    if ep.top_level > level {
        entry = greedy_descent(
            store,
            txn,
            config.metric,
            vector,
            entry,
            ep.top_level,
            level + 1,
            probe,
        )?;
    }

    for layer in (0..=level.min(ep.top_level)).rev() {
        let candidates = search_layer(
            store,
            txn,
            config.metric,
            vector,
            entry.clone(),
            graph.ef_construction,
            layer,
            None,
            probe,
        )?;

        let bound = graph.max_connections(layer);
        let selected = select_neighbors(store, txn, graph, config.metric, &candidates, bound)?;
        for chosen in &selected {
            link(store, txn, graph, config.metric, id, &chosen.id, layer)?;
        }

        // Closest candidate seeds the next layer down.
        if let Some(closest) = candidates.first() {
            entry = closest.clone();
        }
    }

    if level > ep.top_level {
        store.set_entry_point(
            txn,
            &EntryPoint {
                node_id: id.clone(),
                top_level: level,
            },
        )?;
    }

    Ok(())
}
