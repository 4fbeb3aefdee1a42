//! Deletion engine
//!
//! Hard-deletes a node: unlinks every back-reference, repairs
//! neighbors whose adjacency drops below the repair threshold by
//! routing them to the deleted node's other neighbors, removes the
//! record, and reassigns the entry point when it pointed at the
//! deleted node.
//!
//! Because the insertion engine keeps edges symmetric, every node
//! holding a reference to the deleted id appears in the deleted
//! node's own adjacency, so the unlink pass leaves no dangling
//! references behind.

use tracing::{debug, warn};

use quiver_core::{DistanceMetric, IndexConfig, RecordId, Result};
use quiver_storage::Transaction;

use crate::config::GraphConfig;
use crate::distance::distance;
use crate::insert::{link, select_neighbors};
use crate::search::Scored;
use crate::store::{EntryPoint, NodeStore, VectorNode};

/// Delete the node for `id`. Returns `false` (a no-op) when no node
/// exists, so repeated deletion is idempotent.
pub(crate) fn delete<T: Transaction>(
    store: &NodeStore,
    txn: &mut T,
    config: &IndexConfig,
    graph: &GraphConfig,
    id: &RecordId,
) -> Result<bool> {
    let Some(node) = store.get(txn, id)? else {
        debug!(target: "quiver::vector", node = %id, "delete of absent node");
        return Ok(false);
    };

    for layer in 0..node.neighbors.len() {
        for neighbor_id in &node.neighbors[layer] {
            let Some(mut neighbor) = store.get(txn, neighbor_id)? else {
                warn!(
                    target: "quiver::vector",
                    node = %id,
                    neighbor = %neighbor_id,
                    layer,
                    "dangling neighbor reference during unlink"
                );
                continue;
            };
            let Some(adjacency) = neighbor.neighbors.get_mut(layer) else {
                warn!(
                    target: "quiver::vector",
                    node = %id,
                    neighbor = %neighbor_id,
                    layer,
                    "neighbor does not reach this level"
                );
                continue;
            };
            adjacency.remove(id);
            let remaining = adjacency.len();
            store.put(txn, neighbor_id, &neighbor)?;

            // Always repair an emptied adjacency; below the threshold
            // the neighbor gets reconnection candidates as well.
            if remaining < graph.repair_threshold.max(1) {
                reconnect(store, txn, graph, config.metric, &node, neighbor_id, layer)?;
            }
        }
    }

    store.delete(txn, id)?;

    if let Some(ep) = store.entry_point(txn)? {
        if ep.node_id == *id {
            reassign_entry_point(store, txn)?;
        }
    }

    Ok(true)
}

/// Route an under-connected survivor to the deleted node's other
/// neighbors at the same level, through the same selection heuristic
/// and symmetric-link maintenance as insertion.
fn reconnect<T: Transaction>(
    store: &NodeStore,
    txn: &mut T,
    graph: &GraphConfig,
    metric: DistanceMetric,
    deleted: &VectorNode,
    neighbor_id: &RecordId,
    layer: usize,
) -> Result<()> {
    let Some(neighbor) = store.get(txn, neighbor_id)? else {
        return Ok(());
    };
    let bound = graph.max_connections(layer);
    let current = &neighbor.neighbors[layer];
    let room = bound.saturating_sub(current.len());
    if room == 0 {
        return Ok(());
    }

    let mut scored = Vec::new();
    for candidate_id in &deleted.neighbors[layer] {
        if candidate_id == neighbor_id || current.contains(candidate_id) {
            continue;
        }
        let Some(candidate) = store.get(txn, candidate_id)? else {
            continue;
        };
        scored.push(Scored {
            dist: distance(&neighbor.vector, &candidate.vector, metric)?,
            id: candidate_id.clone(),
        });
    }
    scored.sort();

    let chosen = select_neighbors(store, txn, graph, metric, &scored, room)?;
    for pick in &chosen {
        link(store, txn, graph, metric, neighbor_id, &pick.id, layer)?;
    }
    Ok(())
}

/// Promote the surviving node with the highest level to entry point,
/// or clear it when the graph is empty. Ties break toward the smaller
/// id for determinism.
fn reassign_entry_point<T: Transaction>(store: &NodeStore, txn: &mut T) -> Result<()> {
    let survivors = store.scan(txn)?;
    let replacement = survivors.iter().max_by(|(a_id, a), (b_id, b)| {
        a.max_level()
            .cmp(&b.max_level())
            .then_with(|| b_id.cmp(a_id))
    });

    match replacement {
        Some((id, node)) => {
            debug!(
                target: "quiver::vector",
                node = %id,
                top_level = node.max_level(),
                "entry point reassigned"
            );
            store.set_entry_point(
                txn,
                &EntryPoint {
                    node_id: id.clone(),
                    top_level: node.max_level(),
                },
            )
        }
        None => {
            debug!(target: "quiver::vector", "last node removed, entry point cleared");
            store.clear_entry_point(txn)
        }
    }
}
