//! Connectivity validator
//!
//! Full-graph diagnostic: BFS from the entry point at every level it
//! claims, plus structural checks for dangling references, missing
//! entry points, and asymmetric links. Produces a report rather than
//! failing, so callers can surface partial damage.

use std::collections::{BTreeSet, HashMap, VecDeque};

use serde::Serialize;
use tracing::warn;

use quiver_core::{Error, RecordId, Result};
use quiver_storage::Transaction;

use crate::store::{NodeStore, VectorNode};

/// Outcome of a full-graph connectivity sweep.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectivityReport {
    /// True when every node that participates in a level is reachable
    /// from the entry point at that level and no structural defect
    /// was found.
    pub is_fully_connected: bool,
    /// Nodes unreachable from the entry point, as (level, id) pairs.
    pub isolated: Vec<(usize, RecordId)>,
    /// Human-readable structural defects (dangling references,
    /// entry-point problems).
    pub defects: Vec<String>,
    /// Directed edges whose reverse edge is absent. Small counts are
    /// expected after pruning; large counts indicate damage.
    pub asymmetric_links: usize,
}

impl ConnectivityReport {
    fn empty() -> Self {
        ConnectivityReport {
            is_fully_connected: true,
            isolated: Vec::new(),
            defects: Vec::new(),
            asymmetric_links: 0,
        }
    }
}

pub(crate) fn validate<T: Transaction>(store: &NodeStore, txn: &T) -> Result<ConnectivityReport> {
    let nodes = store.scan(txn)?;
    let entry = store.entry_point(txn)?;

    let mut report = ConnectivityReport::empty();
    if nodes.is_empty() {
        if let Some(ep) = entry {
            report.defects.push(format!(
                "entry point {} set on an empty graph",
                ep.node_id
            ));
            report.is_fully_connected = false;
        }
        return Ok(report);
    }

    let by_id: HashMap<&RecordId, &VectorNode> =
        nodes.iter().map(|(id, node)| (id, node)).collect();

    // Structural sweep: dangling references, one-way edges, and
    // base-level isolation.
    for (id, node) in &nodes {
        if nodes.len() > 1 && node.neighbors_at(0).map_or(true, |set| set.is_empty()) {
            report
                .defects
                .push(format!("node {id} has no level-0 neighbors"));
        }
        for (level, adjacency) in node.neighbors.iter().enumerate() {
            for neighbor_id in adjacency {
                match by_id.get(neighbor_id) {
                    None => report.defects.push(format!(
                        "node {id} references missing node {neighbor_id} at level {level}"
                    )),
                    Some(other) => {
                        let reciprocal = other
                            .neighbors_at(level)
                            .map_or(false, |set| set.contains(id));
                        if !reciprocal {
                            report.asymmetric_links += 1;
                        }
                    }
                }
            }
        }
    }

    let Some(ep) = entry else {
        report
            .defects
            .push(format!("{} nodes exist without an entry point", nodes.len()));
        report.is_fully_connected = false;
        return Ok(report);
    };

    let Some(entry_node) = by_id.get(&ep.node_id) else {
        report.defects.push(format!(
            "entry point references missing node {}",
            ep.node_id
        ));
        report.is_fully_connected = false;
        return Ok(report);
    };

    if entry_node.max_level() < ep.top_level {
        report.defects.push(format!(
            "entry point claims level {} but node {} stops at level {}",
            ep.top_level,
            ep.node_id,
            entry_node.max_level()
        ));
    }

    // Per-level reachability from the entry point.
    for level in 0..=ep.top_level.min(entry_node.max_level()) {
        let members: BTreeSet<&RecordId> = nodes
            .iter()
            .filter(|(_, node)| node.max_level() >= level)
            .map(|(id, _)| id)
            .collect();

        let mut visited: BTreeSet<&RecordId> = BTreeSet::new();
        let mut queue: VecDeque<&RecordId> = VecDeque::new();
        visited.insert(&ep.node_id);
        queue.push_back(&ep.node_id);

        while let Some(current) = queue.pop_front() {
            let Some(node) = by_id.get(current) else {
                continue;
            };
            let Some(adjacency) = node.neighbors_at(level) else {
                continue;
            };
            for neighbor_id in adjacency {
                if let Some((id, _)) = by_id.get_key_value(neighbor_id) {
                    if visited.insert(*id) {
                        queue.push_back(*id);
                    }
                }
            }
        }

        for member in members {
            if !visited.contains(member) {
                report.isolated.push((level, (*member).clone()));
            }
        }
    }

    report.is_fully_connected = report.isolated.is_empty() && report.defects.is_empty();
    if !report.is_fully_connected {
        warn!(
            target: "quiver::vector",
            isolated = report.isolated.len(),
            defects = report.defects.len(),
            asymmetric = report.asymmetric_links,
            "connectivity sweep found damage"
        );
    }
    Ok(report)
}

/// Same sweep, but disconnection becomes a hard error.
pub(crate) fn assert_connected(report: &ConnectivityReport) -> Result<()> {
    if report.is_fully_connected {
        return Ok(());
    }
    Err(Error::Corruption(format!(
        "graph is not fully connected: {} isolated node(s), {} defect(s)",
        report.isolated.len(),
        report.defects.len()
    )))
}
