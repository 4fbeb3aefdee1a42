//! HNSW graph tuning parameters
//!
//! Separate from `quiver_core::IndexConfig` on purpose: dimension and
//! metric are part of the index's public contract, while these knobs
//! only shape construction cost versus search quality.

/// Graph construction and search parameters
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Max neighbors per node per level (level 0 uses 2*m)
    pub m: usize,
    /// Build-time beam width
    pub ef_construction: usize,
    /// Default search-time beam width when the query does not supply one
    pub ef_search: usize,
    /// Level multiplier: 1/ln(m)
    pub ml: f64,
    /// Routing optimization: backfill the neighbor list with nearest
    /// rejected candidates when the diversity heuristic under-fills it.
    /// Trades construction cost for search quality.
    pub extend_candidates: bool,
    /// A neighbor whose adjacency at some level shrinks below this
    /// after an unlink gets reconnection candidates during deletion.
    pub repair_threshold: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self::new(16)
    }
}

impl GraphConfig {
    /// Config with the given fan-out and derived defaults
    pub fn new(m: usize) -> Self {
        let m = m.max(2);
        Self {
            m,
            ef_construction: 200,
            ef_search: 50,
            ml: 1.0 / (m as f64).ln(),
            extend_candidates: true,
            repair_threshold: m / 2,
        }
    }

    /// Max connections at the given level (2*m at level 0)
    pub fn max_connections(&self, level: usize) -> usize {
        if level == 0 {
            self.m * 2
        } else {
            self.m
        }
    }
}
