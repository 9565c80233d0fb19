//! Query orchestration and response shaping
//!
//! One service instance owns an injected `GraphStore` (or none, when
//! ingestion never completed) and answers the five logical operations of
//! the API. Response field names are part of the contract with the
//! existing front end and must not change.

use crate::centrality::{self, CentralityMetric};
use crate::cluster::{
    Aggregation, Aggregator, BoundedDetectionCache, CommunityDetector, DetectionCache,
    CATCH_ALL_CLUSTER,
};
use crate::config::Config;
use crate::error::QueryError;
use crate::graph::{GraphStore, ViewFilter, WeightedGraph};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
    pub id: u32,
    pub label: String,
    pub degree: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphEdge {
    pub source: u32,
    pub target: u32,
    pub weight: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphStats {
    pub num_nodes: usize,
    pub num_edges: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphResponse {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub stats: GraphStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicationEntry {
    pub id: u32,
    pub title: String,
    pub year: i32,
    pub venue: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoauthorEntry {
    pub id: u32,
    pub name: String,
    pub collaborations: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeInfoResponse {
    pub id: u32,
    pub name: String,
    /// Publications descending by year
    pub publications: Vec<PublicationEntry>,
    /// Coauthors descending by collaboration count
    pub coauthors: Vec<CoauthorEntry>,
    /// Distinct publication years, ascending
    pub years_active: Vec<i32>,
    pub total_publications: usize,
    pub total_coauthors: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedAuthor {
    pub id: u32,
    pub name: String,
    pub centrality: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CentralityResponse {
    pub metric: String,
    pub top_authors: Vec<RankedAuthor>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub size: usize,
    pub degree: usize,
    pub cluster_id: i32,
    pub nodes: Vec<u32>,
    pub central_node: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterEdge {
    pub source: String,
    pub target: String,
    pub weight: u32,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterViewStats {
    pub num_nodes: usize,
    pub num_edges: usize,
    pub total_original_nodes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterViewResponse {
    pub nodes: Vec<ClusterNode>,
    pub edges: Vec<ClusterEdge>,
    pub stats: ClusterViewStats,
    pub level: String,
    pub node_to_community: HashMap<u32, i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberNode {
    pub id: u32,
    pub label: String,
    pub degree: usize,
    #[serde(rename = "type")]
    pub kind: String,
    pub cluster_id: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberEdge {
    pub source: u32,
    pub target: u32,
    pub weight: u32,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeViewResponse {
    pub nodes: Vec<MemberNode>,
    pub edges: Vec<MemberEdge>,
    pub stats: GraphStats,
    pub level: String,
    pub cluster_id: i32,
}

/// Cluster-level view by default, node-level drill-down on request.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AggregatedResponse {
    Cluster(ClusterViewResponse),
    Node(NodeViewResponse),
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub total_authors: usize,
    pub total_publications: usize,
    pub graph_nodes: usize,
    pub graph_edges: usize,
}

#[derive(Debug, Clone, Default)]
pub struct GraphQuery {
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub venue: Option<String>,
    pub limit: Option<usize>,
}

/// Aggregation level of `get_graph_aggregated`. Only the literal "node"
/// selects drill-down; anything else is the cluster view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewLevel {
    #[default]
    Cluster,
    Node,
}

impl ViewLevel {
    pub fn parse(level: &str) -> Self {
        if level == "node" {
            Self::Node
        } else {
            Self::Cluster
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AggregatedQuery {
    pub level: ViewLevel,
    pub cluster_id: Option<i32>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub venue: Option<String>,
    pub min_cluster_size: Option<usize>,
    pub limit: Option<usize>,
}

/// Read-only query facade over one graph store.
pub struct QueryService {
    store: Option<Arc<GraphStore>>,
    aggregator: Aggregator,
    config: Config,
}

impl QueryService {
    /// Service with the default bounded detection cache.
    pub fn new(store: Option<Arc<GraphStore>>, config: Config) -> Self {
        let cache = Arc::new(BoundedDetectionCache::new(config.cache_capacity));
        Self::with_cache(store, cache, config)
    }

    /// Service with an injected detection cache implementation.
    pub fn with_cache(
        store: Option<Arc<GraphStore>>,
        cache: Arc<dyn DetectionCache>,
        config: Config,
    ) -> Self {
        let detector = Arc::new(CommunityDetector::new(cache));
        Self {
            store,
            aggregator: Aggregator::new(detector),
            config,
        }
    }

    fn store(&self) -> Result<&GraphStore, QueryError> {
        self.store.as_deref().ok_or(QueryError::ServiceUnavailable)
    }

    /// Filtered node/edge view of the coauthorship graph.
    pub fn get_graph(&self, query: &GraphQuery) -> Result<GraphResponse, QueryError> {
        let store = self.store()?;
        let filter = ViewFilter {
            year_from: query.year_from,
            year_to: query.year_to,
            venue: query.venue.clone(),
            limit: query.limit,
        };
        let view = filter.apply(store)?;
        Ok(shape_graph(store, &view))
    }

    /// Publications, coauthors and activity span of one author.
    pub fn get_node_info(&self, author_id: u32) -> Result<NodeInfoResponse, QueryError> {
        let store = self.store()?;
        if !store.contains_author(author_id) {
            return Err(QueryError::author_not_found(author_id));
        }

        let mut publications = Vec::new();
        let mut years = BTreeSet::new();
        for &publication_id in store.author_publications(author_id) {
            let Some(publication) = store.publication(publication_id) else {
                continue;
            };
            publications.push(PublicationEntry {
                id: publication_id,
                title: publication.title.clone(),
                year: publication.year,
                venue: publication.venue.clone(),
                kind: publication.kind.clone(),
            });
            if publication.year != 0 {
                years.insert(publication.year);
            }
        }
        publications.sort_by(|a, b| b.year.cmp(&a.year).then(a.id.cmp(&b.id)));

        // An ingested author without coauthorships is not a graph node
        let mut coauthors: Vec<CoauthorEntry> = if store.graph().contains(author_id) {
            store
                .neighbors(author_id)?
                .into_iter()
                .map(|(id, collaborations)| CoauthorEntry {
                    id,
                    name: store.display_name(id),
                    collaborations,
                })
                .collect()
        } else {
            Vec::new()
        };
        coauthors.sort_by(|a, b| b.collaborations.cmp(&a.collaborations).then(a.id.cmp(&b.id)));

        Ok(NodeInfoResponse {
            id: author_id,
            name: store.display_name(author_id),
            total_publications: publications.len(),
            total_coauthors: coauthors.len(),
            publications,
            coauthors,
            years_active: years.into_iter().collect(),
        })
    }

    /// Top authors of the base graph by a centrality metric.
    pub fn get_centrality(&self, metric: &str, top: usize) -> Result<CentralityResponse, QueryError> {
        let store = self.store()?;
        let metric: CentralityMetric = metric.parse()?;

        let top_authors = centrality::rank(store.graph(), metric, top)
            .into_iter()
            .map(|(id, score)| RankedAuthor {
                id,
                name: store.display_name(id),
                centrality: score,
            })
            .collect();

        Ok(CentralityResponse {
            metric: metric.as_str().to_string(),
            top_authors,
        })
    }

    /// Aggregated cluster view, or the drill-down view of one cluster.
    pub fn get_graph_aggregated(
        &self,
        query: &AggregatedQuery,
    ) -> Result<AggregatedResponse, QueryError> {
        let store = self.store()?;
        let filter = ViewFilter {
            year_from: query.year_from,
            year_to: query.year_to,
            venue: query.venue.clone(),
            limit: query.limit,
        };
        let view = filter.apply(store)?;
        if view.node_count() == 0 {
            return Err(QueryError::EmptyResult);
        }

        let min_cluster_size = query.min_cluster_size.unwrap_or(self.config.min_cluster_size);
        let aggregation = self.aggregator.aggregate(&view, min_cluster_size);

        match query.level {
            ViewLevel::Node => {
                let cluster_id = query
                    .cluster_id
                    .ok_or_else(|| QueryError::NotFound("cluster id".to_string()))?;
                let summary = aggregation
                    .cluster(cluster_id)
                    .ok_or_else(|| QueryError::cluster_not_found(cluster_id))?;
                Ok(AggregatedResponse::Node(shape_members(
                    store,
                    &view,
                    cluster_id,
                    &summary.members,
                )))
            }
            ViewLevel::Cluster => Ok(AggregatedResponse::Cluster(shape_clusters(
                &view,
                &aggregation,
            ))),
        }
    }

    /// Corpus-wide counts.
    pub fn get_stats(&self) -> Result<StatsResponse, QueryError> {
        let store = self.store()?;
        Ok(StatsResponse {
            total_authors: store.author_count(),
            total_publications: store.publication_count(),
            graph_nodes: store.graph().node_count(),
            graph_edges: store.graph().edge_count(),
        })
    }
}

fn shape_graph(store: &GraphStore, graph: &WeightedGraph) -> GraphResponse {
    let nodes: Vec<GraphNode> = graph
        .nodes()
        .map(|id| GraphNode {
            id,
            label: store.display_name(id),
            degree: graph.degree(id).unwrap_or(0),
        })
        .collect();

    let edges: Vec<GraphEdge> = graph
        .edges()
        .map(|(source, target, weight)| GraphEdge {
            source,
            target,
            weight,
        })
        .collect();

    GraphResponse {
        stats: GraphStats {
            num_nodes: nodes.len(),
            num_edges: edges.len(),
        },
        nodes,
        edges,
    }
}

fn cluster_display_label(cluster_id: i32, size: usize) -> String {
    if cluster_id == CATCH_ALL_CLUSTER {
        format!("Other ({size} nodes)")
    } else {
        format!("Cluster {cluster_id} ({size} nodes)")
    }
}

fn shape_clusters(view: &WeightedGraph, aggregation: &Aggregation) -> ClusterViewResponse {
    let nodes: Vec<ClusterNode> = aggregation
        .clusters
        .iter()
        .map(|cluster| ClusterNode {
            id: format!("cluster_{}", cluster.cluster_id),
            label: cluster_display_label(cluster.cluster_id, cluster.size),
            kind: "cluster".to_string(),
            size: cluster.size,
            degree: cluster.degree,
            cluster_id: cluster.cluster_id,
            nodes: cluster.members.clone(),
            central_node: cluster.central_node,
        })
        .collect();

    let edges: Vec<ClusterEdge> = aggregation
        .links
        .iter()
        .map(|link| ClusterEdge {
            source: format!("cluster_{}", link.source),
            target: format!("cluster_{}", link.target),
            weight: link.weight,
            kind: "cluster_edge".to_string(),
        })
        .collect();

    ClusterViewResponse {
        stats: ClusterViewStats {
            num_nodes: nodes.len(),
            num_edges: edges.len(),
            total_original_nodes: view.node_count(),
        },
        nodes,
        edges,
        level: "cluster".to_string(),
        node_to_community: aggregation.assignment.as_ref().clone(),
    }
}

fn shape_members(
    store: &GraphStore,
    view: &WeightedGraph,
    cluster_id: i32,
    members: &[u32],
) -> NodeViewResponse {
    let keep: HashSet<u32> = members.iter().copied().collect();
    let subgraph = view.induced_subgraph(&keep);

    let nodes: Vec<MemberNode> = subgraph
        .nodes()
        .map(|id| MemberNode {
            id,
            label: store.display_name(id),
            degree: subgraph.degree(id).unwrap_or(0),
            kind: "node".to_string(),
            cluster_id,
        })
        .collect();

    let edges: Vec<MemberEdge> = subgraph
        .edges()
        .map(|(source, target, weight)| MemberEdge {
            source,
            target,
            weight,
            kind: "node_edge".to_string(),
        })
        .collect();

    NodeViewResponse {
        stats: GraphStats {
            num_nodes: nodes.len(),
            num_edges: edges.len(),
        },
        nodes,
        edges,
        level: "node".to_string(),
        cluster_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AuthorRecord, AuthorshipRecord, Dataset, PublicationRecord};

    fn publication(id: u32, year: i32, venue: &str) -> PublicationRecord {
        PublicationRecord {
            id,
            title: format!("Paper {id}"),
            year,
            venue: venue.to_string(),
            kind: "article".to_string(),
        }
    }

    fn link(publication: u32, author: u32) -> AuthorshipRecord {
        AuthorshipRecord {
            publication,
            author,
        }
    }

    /// Triangle 1-2-3 (1-2 twice), triangle 4-5-6 bridged over 3-4 by a
    /// 2021 publication, pair 7-8, plus author 9 with a solo paper.
    fn dataset() -> Dataset {
        Dataset {
            authors: (1..=9)
                .map(|id| AuthorRecord {
                    id,
                    name: format!("Author {id}"),
                })
                .collect(),
            publications: vec![
                publication(100, 2019, "ICSE"),
                publication(101, 2020, "ICSE"),
                publication(102, 2020, "FSE"),
                publication(103, 2021, "POPL"),
                publication(104, 2021, "POPL"),
                publication(105, 2022, "Journal of Tests"),
            ],
            authorship: vec![
                link(100, 1),
                link(100, 2),
                link(101, 1),
                link(101, 2),
                link(101, 3),
                link(102, 4),
                link(102, 5),
                link(102, 6),
                link(103, 3),
                link(103, 4),
                link(104, 7),
                link(104, 8),
                link(105, 9),
            ],
        }
    }

    fn service() -> QueryService {
        let store = Arc::new(crate::graph::GraphStore::from_dataset(dataset()));
        QueryService::new(Some(store), Config::default())
    }

    fn unavailable() -> QueryService {
        QueryService::new(None, Config::default())
    }

    #[test]
    fn every_operation_requires_a_loaded_store() {
        let service = unavailable();
        assert!(matches!(
            service.get_graph(&GraphQuery::default()),
            Err(QueryError::ServiceUnavailable)
        ));
        assert!(matches!(
            service.get_node_info(1),
            Err(QueryError::ServiceUnavailable)
        ));
        assert!(matches!(
            service.get_centrality("degree", 10),
            Err(QueryError::ServiceUnavailable)
        ));
        assert!(matches!(
            service.get_graph_aggregated(&AggregatedQuery::default()),
            Err(QueryError::ServiceUnavailable)
        ));
        assert!(matches!(
            service.get_stats(),
            Err(QueryError::ServiceUnavailable)
        ));
    }

    #[test]
    fn stats_count_corpus_and_graph_separately() {
        let stats = service().get_stats().unwrap();
        assert_eq!(stats.total_authors, 9);
        assert_eq!(stats.total_publications, 6);
        // author 9 published solo and never enters the graph
        assert_eq!(stats.graph_nodes, 8);
        assert_eq!(stats.graph_edges, 8);
    }

    #[test]
    fn graph_response_shapes_nodes_and_stats() {
        let response = service().get_graph(&GraphQuery::default()).unwrap();
        assert_eq!(response.stats.num_nodes, 8);
        assert_eq!(response.stats.num_edges, 8);

        let first = &response.nodes[0];
        assert_eq!(first.id, 1);
        assert_eq!(first.label, "Author 1");
        assert_eq!(first.degree, 2);

        let heavy = response
            .edges
            .iter()
            .find(|e| e.source == 1 && e.target == 2)
            .expect("1-2 edge");
        assert_eq!(heavy.weight, 2);
    }

    #[test]
    fn graph_query_with_filters_composes() {
        let query = GraphQuery {
            year_from: Some(2020),
            year_to: Some(2020),
            venue: Some("icse".to_string()),
            limit: None,
        };
        let response = service().get_graph(&query).unwrap();

        let mut ids: Vec<u32> = response.nodes.iter().map(|n| n.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn empty_filter_match_with_limit_is_soft() {
        let query = GraphQuery {
            venue: Some("nowhere".to_string()),
            limit: Some(5),
            ..Default::default()
        };
        let err = service().get_graph(&query).unwrap_err();
        assert!(err.is_empty_result());
    }

    #[test]
    fn node_info_orders_publications_and_coauthors() {
        let info = service().get_node_info(3).unwrap();
        assert_eq!(info.name, "Author 3");

        // publications descending by year: 103 (2021), 101 (2020)
        let publication_ids: Vec<u32> = info.publications.iter().map(|p| p.id).collect();
        assert_eq!(publication_ids, vec![103, 101]);
        assert_eq!(info.total_publications, 2);

        // coauthors descending by collaborations, ids break the ties
        let coauthor_ids: Vec<u32> = info.coauthors.iter().map(|c| c.id).collect();
        assert_eq!(coauthor_ids, vec![1, 2, 4]);
        assert_eq!(info.total_coauthors, 3);

        assert_eq!(info.years_active, vec![2020, 2021]);
    }

    #[test]
    fn node_info_for_an_author_outside_the_graph() {
        let info = service().get_node_info(9).unwrap();
        assert_eq!(info.total_publications, 1);
        assert!(info.coauthors.is_empty());
        assert_eq!(info.total_coauthors, 0);
    }

    #[test]
    fn node_info_unknown_author_is_not_found() {
        assert!(matches!(
            service().get_node_info(999),
            Err(QueryError::NotFound(_))
        ));
    }

    #[test]
    fn centrality_rejects_unknown_metrics() {
        assert!(matches!(
            service().get_centrality("unknown", 10),
            Err(QueryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn centrality_ranks_and_names_authors() {
        let response = service().get_centrality("degree", 3).unwrap();
        assert_eq!(response.metric, "degree");
        assert_eq!(response.top_authors.len(), 3);
        // 3 and 4 share the top degree of 3; the smaller id leads
        assert_eq!(response.top_authors[0].id, 3);
        assert_eq!(response.top_authors[0].name, "Author 3");
        assert!((response.top_authors[0].centrality - 3.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn aggregated_cluster_view_has_catch_all_and_mapping() {
        let response = service()
            .get_graph_aggregated(&AggregatedQuery::default())
            .unwrap();
        let AggregatedResponse::Cluster(view) = response else {
            panic!("expected cluster view");
        };

        assert_eq!(view.level, "cluster");
        assert_eq!(view.stats.total_original_nodes, 8);
        assert_eq!(view.node_to_community.len(), 8);

        // components: {1..6} retained, {7, 8} pooled
        let sizes: Vec<usize> = view.nodes.iter().map(|n| n.size).collect();
        assert_eq!(sizes, vec![6, 2]);

        let catch_all = view.nodes.last().expect("catch-all node");
        assert_eq!(catch_all.id, "cluster_-1");
        assert_eq!(catch_all.cluster_id, CATCH_ALL_CLUSTER);
        assert_eq!(catch_all.label, "Other (2 nodes)");
        assert_eq!(catch_all.kind, "cluster");

        let retained = &view.nodes[0];
        assert_eq!(retained.id, "cluster_0");
        assert_eq!(retained.label, "Cluster 0 (6 nodes)");
        assert_eq!(retained.central_node, 3);
    }

    #[test]
    fn drill_down_returns_the_member_subgraph() {
        let query = AggregatedQuery {
            level: ViewLevel::Node,
            cluster_id: Some(0),
            ..Default::default()
        };
        let response = service().get_graph_aggregated(&query).unwrap();
        let AggregatedResponse::Node(view) = response else {
            panic!("expected node view");
        };

        assert_eq!(view.level, "node");
        assert_eq!(view.cluster_id, 0);
        assert_eq!(view.stats.num_nodes, 6);
        assert_eq!(view.stats.num_edges, 7);
        assert!(view.nodes.iter().all(|n| n.kind == "node"));
        assert!(view.edges.iter().all(|e| e.kind == "node_edge"));
    }

    #[test]
    fn drill_down_into_missing_cluster_is_not_found() {
        let query = AggregatedQuery {
            level: ViewLevel::Node,
            cluster_id: Some(42),
            ..Default::default()
        };
        assert!(matches!(
            service().get_graph_aggregated(&query),
            Err(QueryError::NotFound(_))
        ));
    }

    #[test]
    fn drill_down_without_cluster_id_is_not_found() {
        let query = AggregatedQuery {
            level: ViewLevel::Node,
            cluster_id: None,
            ..Default::default()
        };
        assert!(matches!(
            service().get_graph_aggregated(&query),
            Err(QueryError::NotFound(_))
        ));
    }

    #[test]
    fn aggregated_view_on_empty_filter_match_is_soft() {
        let query = AggregatedQuery {
            venue: Some("nowhere".to_string()),
            ..Default::default()
        };
        let err = service().get_graph_aggregated(&query).unwrap_err();
        assert!(err.is_empty_result());
    }

    #[test]
    fn view_level_parsing_defaults_to_cluster() {
        assert_eq!(ViewLevel::parse("node"), ViewLevel::Node);
        assert_eq!(ViewLevel::parse("cluster"), ViewLevel::Cluster);
        assert_eq!(ViewLevel::parse("anything"), ViewLevel::Cluster);
    }
}
