//! Tiered community detection with fingerprint caching
//!
//! Strategy selection by node count: tiny graphs get exact connected
//! components, mid-size graphs greedy modularity, large graphs seeded
//! label propagation. Each probabilistic tier degrades through an
//! explicit fallback chain ending at connected components, so detection
//! as a whole never fails.

use crate::cluster::algorithms::{self, DetectError};
use crate::cluster::cache::DetectionCache;
use crate::cluster::CommunityAssignment;
use crate::graph::WeightedGraph;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Below this node count, exact connected components are cheapest.
const COMPONENT_TIER_LIMIT: usize = 50;

/// Up to this node count, greedy modularity is affordable.
const MODULARITY_TIER_LIMIT: usize = 500;

/// Fixed seed so label propagation is reproducible across queries.
const LABEL_PROPAGATION_SEED: u64 = 42;

const LABEL_PROPAGATION_MAX_ITERS: usize = 100;

/// Cache key summarizing a graph's identity: counts plus content hashes
/// of the sorted node and edge sets. Any change to either set changes
/// the fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphFingerprint {
    node_count: usize,
    edge_count: usize,
    node_hash: u64,
    edge_hash: u64,
}

impl GraphFingerprint {
    /// Fingerprint the node and edge sets. The representation stores
    /// node ids ascending and enumerates edges in ascending pair order,
    /// so hashing in storage order is hashing in sorted order.
    pub fn of(graph: &WeightedGraph) -> Self {
        let mut node_hasher = DefaultHasher::new();
        for id in graph.nodes() {
            id.hash(&mut node_hasher);
        }

        let mut edge_hasher = DefaultHasher::new();
        for (source, target, _) in graph.edges() {
            (source, target).hash(&mut edge_hasher);
        }

        Self {
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            node_hash: node_hasher.finish(),
            edge_hash: edge_hasher.finish(),
        }
    }
}

/// Size-tiered community detection over a shared partition cache.
pub struct CommunityDetector {
    cache: Arc<dyn DetectionCache>,
}

impl CommunityDetector {
    pub fn new(cache: Arc<dyn DetectionCache>) -> Self {
        Self { cache }
    }

    /// Partition the graph into communities.
    ///
    /// Covers every node exactly once and is deterministic per
    /// fingerprint: identical node/edge sets return the identical cached
    /// mapping without recomputation. Algorithm failures degrade through
    /// the fallback chain and never surface.
    pub fn detect(&self, graph: &WeightedGraph) -> Arc<CommunityAssignment> {
        if graph.node_count() == 0 {
            return Arc::new(CommunityAssignment::new());
        }

        let key = GraphFingerprint::of(graph);
        if let Some(cached) = self.cache.get(&key) {
            log::debug!(
                "community cache hit for graph with {} nodes",
                graph.node_count()
            );
            return cached;
        }

        let mut assignment = partition_tiered(graph);
        assign_missing(graph, &mut assignment);
        self.cache.insert(key, Arc::new(assignment))
    }
}

/// Pick the partitioning strategy by graph size.
fn partition_tiered(graph: &WeightedGraph) -> CommunityAssignment {
    let n = graph.node_count();

    if n < COMPONENT_TIER_LIMIT {
        return algorithms::connected_components(graph);
    }

    let primary = if n > MODULARITY_TIER_LIMIT {
        log::debug!("partitioning {} nodes with label propagation", n);
        modularity_on_failure(
            graph,
            algorithms::label_propagation(
                graph,
                LABEL_PROPAGATION_MAX_ITERS,
                LABEL_PROPAGATION_SEED,
            ),
        )
    } else {
        log::debug!("partitioning {} nodes with greedy modularity", n);
        algorithms::greedy_modularity(graph)
    };

    components_on_failure(graph, primary)
}

/// First link of the fallback chain: a failed label propagation retries
/// with greedy modularity.
fn modularity_on_failure(
    graph: &WeightedGraph,
    outcome: Result<CommunityAssignment, DetectError>,
) -> Result<CommunityAssignment, DetectError> {
    match outcome {
        Ok(assignment) => Ok(assignment),
        Err(err) => {
            log::warn!("label propagation failed ({err}), retrying with greedy modularity");
            algorithms::greedy_modularity(graph)
        }
    }
}

/// Last link of the fallback chain: connected components always succeed.
fn components_on_failure(
    graph: &WeightedGraph,
    outcome: Result<CommunityAssignment, DetectError>,
) -> CommunityAssignment {
    match outcome {
        Ok(assignment) => assignment,
        Err(err) => {
            log::warn!("community detection degraded to connected components: {err}");
            algorithms::connected_components(graph)
        }
    }
}

/// Give every node the primary pass missed a fresh singleton community,
/// appended after the current maximum label.
fn assign_missing(graph: &WeightedGraph, assignment: &mut CommunityAssignment) {
    let mut next = assignment.values().copied().max().map_or(0, |max| max + 1);
    for id in graph.nodes() {
        if !assignment.contains_key(&id) {
            assignment.insert(id, next);
            next += 1;
        }
    }
}
