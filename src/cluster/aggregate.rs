//! Cluster-level aggregation of a partitioned graph

use crate::cluster::detection::CommunityDetector;
use crate::cluster::{CommunityAssignment, CATCH_ALL_CLUSTER};
use crate::graph::WeightedGraph;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Aggregate view of one cluster
#[derive(Debug, Clone)]
pub struct ClusterSummary {
    pub cluster_id: i32,

    /// Member author ids, ascending
    pub members: Vec<u32>,

    pub size: usize,

    /// Sum of the members' degree in the source view, not the
    /// intra-cluster degree
    pub degree: usize,

    /// Max-degree member; ties fall to the earliest member
    pub central_node: u32,
}

/// Aggregated connection between two retained clusters
#[derive(Debug, Clone, Copy)]
pub struct ClusterLink {
    pub source: i32,
    pub target: i32,

    /// Number of cross-cluster edges between the pair
    pub weight: u32,
}

/// Result of one aggregation pass. The assignment is the exact mapping
/// the clusters were derived from; drill-down reuses it instead of
/// recomputing the partition.
pub struct Aggregation {
    /// Retained clusters ascending by id, catch-all last
    pub clusters: Vec<ClusterSummary>,

    /// Links ascending by (source, target)
    pub links: Vec<ClusterLink>,

    pub assignment: Arc<CommunityAssignment>,
}

impl Aggregation {
    /// Summary of one cluster, if it is part of this aggregation.
    pub fn cluster(&self, cluster_id: i32) -> Option<&ClusterSummary> {
        self.clusters.iter().find(|c| c.cluster_id == cluster_id)
    }
}

/// Converts community partitions into a cluster-level super-graph.
pub struct Aggregator {
    detector: Arc<CommunityDetector>,
}

impl Aggregator {
    pub fn new(detector: Arc<CommunityDetector>) -> Self {
        Self { detector }
    }

    /// Partition the graph and pool the communities into clusters.
    pub fn aggregate(&self, graph: &WeightedGraph, min_cluster_size: usize) -> Aggregation {
        let assignment = self.detector.detect(graph);
        pool(graph, assignment, min_cluster_size)
    }
}

/// Pool a community assignment into the cluster-level view.
///
/// Communities with at least `min_cluster_size` members keep their own
/// cluster; all members of smaller communities pool into the catch-all,
/// which exists only if such communities exist. Links count the edges
/// between two distinct retained clusters; edges inside one cluster or
/// touching a pooled member are dropped, so the catch-all never carries
/// links. This is intentional lossy compression.
fn pool(
    graph: &WeightedGraph,
    assignment: Arc<CommunityAssignment>,
    min_cluster_size: usize,
) -> Aggregation {
    // Group members in dense order so each list is ascending
    let mut groups: BTreeMap<i32, Vec<u32>> = BTreeMap::new();
    for id in graph.nodes() {
        if let Some(&label) = assignment.get(&id) {
            groups.entry(label).or_default().push(id);
        }
    }

    let mut retained: Vec<(i32, Vec<u32>)> = Vec::new();
    let mut pooled: Vec<u32> = Vec::new();
    for (label, members) in groups {
        if members.len() >= min_cluster_size {
            retained.push((label, members));
        } else {
            pooled.extend(members);
        }
    }

    let retained_labels: HashSet<i32> = retained.iter().map(|&(label, _)| label).collect();

    // Pooled members keep their original undersized label inside the
    // assignment, so only edges between two retained labels survive
    let mut connections: BTreeMap<(i32, i32), u32> = BTreeMap::new();
    for (source, target, _) in graph.edges() {
        let (Some(&label_s), Some(&label_t)) = (assignment.get(&source), assignment.get(&target))
        else {
            continue;
        };
        if label_s != label_t
            && retained_labels.contains(&label_s)
            && retained_labels.contains(&label_t)
        {
            let pair = (label_s.min(label_t), label_s.max(label_t));
            *connections.entry(pair).or_insert(0) += 1;
        }
    }

    let links = connections
        .into_iter()
        .map(|((source, target), weight)| ClusterLink {
            source,
            target,
            weight,
        })
        .collect();

    if !pooled.is_empty() {
        pooled.sort_unstable();
        retained.push((CATCH_ALL_CLUSTER, pooled));
    }

    let clusters = retained
        .into_iter()
        .map(|(label, members)| summarize(graph, label, members))
        .collect();

    Aggregation {
        clusters,
        links,
        assignment,
    }
}

fn summarize(graph: &WeightedGraph, cluster_id: i32, members: Vec<u32>) -> ClusterSummary {
    let mut total_degree = 0;
    let mut central_node = members[0];
    let mut central_degree = 0;

    for (position, &member) in members.iter().enumerate() {
        let degree = graph.degree(member).unwrap_or(0);
        total_degree += degree;
        if position == 0 || degree > central_degree {
            central_degree = degree;
            central_node = member;
        }
    }

    ClusterSummary {
        cluster_id,
        size: members.len(),
        degree: total_degree,
        central_node,
        members,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::cache::BoundedDetectionCache;
    use crate::graph::GraphBuilder;

    fn aggregator() -> Aggregator {
        let cache = Arc::new(BoundedDetectionCache::new(16));
        Aggregator::new(Arc::new(CommunityDetector::new(cache)))
    }

    /// Two triangles bridged by 3-4, plus the isolated pair 7-8.
    fn bridged_graph() -> WeightedGraph {
        let mut builder = GraphBuilder::new();
        builder.add_publication(&[1, 2, 3]);
        builder.add_publication(&[4, 5, 6]);
        builder.add_collaboration(3, 4);
        builder.add_collaboration(7, 8);
        builder.build()
    }

    /// Same topology, but partitioned by hand: triangles split into two
    /// communities despite the bridge, pair 7-8 undersized.
    fn handmade_assignment() -> Arc<CommunityAssignment> {
        Arc::new(CommunityAssignment::from([
            (1, 0),
            (2, 0),
            (3, 0),
            (4, 1),
            (5, 1),
            (6, 1),
            (7, 2),
            (8, 2),
        ]))
    }

    #[test]
    fn cluster_sizes_sum_to_node_count() {
        let graph = bridged_graph();
        let aggregation = aggregator().aggregate(&graph, 3);

        let total: usize = aggregation.clusters.iter().map(|c| c.size).sum();
        assert_eq!(total, graph.node_count());
    }

    #[test]
    fn undersized_communities_pool_into_catch_all() {
        let graph = bridged_graph();
        let aggregation = aggregator().aggregate(&graph, 3);

        // the component tier sees two components: {1..6} and {7, 8}
        let catch_all = aggregation.cluster(CATCH_ALL_CLUSTER).expect("catch-all");
        assert_eq!(catch_all.members, vec![7, 8]);

        // catch-all comes last
        assert_eq!(
            aggregation.clusters.last().map(|c| c.cluster_id),
            Some(CATCH_ALL_CLUSTER)
        );
    }

    #[test]
    fn no_catch_all_without_undersized_communities() {
        let graph = bridged_graph();
        let aggregation = aggregator().aggregate(&graph, 2);

        assert!(aggregation.cluster(CATCH_ALL_CLUSTER).is_none());
        let total: usize = aggregation.clusters.iter().map(|c| c.size).sum();
        assert_eq!(total, graph.node_count());
    }

    #[test]
    fn aggregate_degree_counts_the_source_view() {
        let graph = bridged_graph();
        let aggregation = aggregator().aggregate(&graph, 3);

        let big = aggregation
            .clusters
            .iter()
            .find(|c| c.size == 6)
            .expect("main component cluster");
        // degrees: 1:2, 2:2, 3:3, 4:3, 5:2, 6:2
        assert_eq!(big.degree, 14);
        // max degree 3 is shared by 3 and 4; the earlier member wins
        assert_eq!(big.central_node, 3);
    }

    #[test]
    fn links_count_cross_edges_between_retained_clusters() {
        let graph = bridged_graph();
        let aggregation = pool(&graph, handmade_assignment(), 3);

        // only the 3-4 bridge crosses two retained clusters
        assert_eq!(aggregation.links.len(), 1);
        let link = aggregation.links[0];
        assert_eq!((link.source, link.target, link.weight), (0, 1, 1));
    }

    #[test]
    fn edges_touching_pooled_members_are_dropped() {
        let mut builder = GraphBuilder::new();
        builder.add_publication(&[1, 2, 3]);
        builder.add_publication(&[4, 5, 6]);
        builder.add_collaboration(3, 4);
        builder.add_collaboration(6, 7); // retained -> pooled
        builder.add_collaboration(7, 8); // inside pooled
        let graph = builder.build();

        let aggregation = pool(&graph, handmade_assignment(), 3);

        // the 6-7 and 7-8 edges vanish; the catch-all node exists anyway
        assert_eq!(aggregation.links.len(), 1);
        assert_eq!(
            (aggregation.links[0].source, aggregation.links[0].target),
            (0, 1)
        );
        assert!(aggregation.cluster(CATCH_ALL_CLUSTER).is_some());
    }

    #[test]
    fn parallel_cross_edges_accumulate() {
        let mut builder = GraphBuilder::new();
        builder.add_publication(&[1, 2, 3]);
        builder.add_publication(&[4, 5, 6]);
        builder.add_collaboration(3, 4);
        builder.add_collaboration(1, 5);
        builder.add_collaboration(7, 8);
        let graph = builder.build();

        let aggregation = pool(&graph, handmade_assignment(), 3);

        assert_eq!(aggregation.links.len(), 1);
        assert_eq!(aggregation.links[0].weight, 2);
    }

    #[test]
    fn drill_down_reuses_the_same_assignment() {
        let graph = bridged_graph();
        let aggregation = aggregator().aggregate(&graph, 3);

        let cluster = aggregation.clusters.first().expect("retained cluster");
        let keep: HashSet<u32> = cluster.members.iter().copied().collect();
        let sub = graph.induced_subgraph(&keep);

        assert_eq!(sub.node_count(), cluster.size);
        // every member carries the cluster's label in the assignment
        for member in &cluster.members {
            assert_eq!(aggregation.assignment[member], cluster.cluster_id);
        }
    }
}
