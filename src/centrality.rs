//! Centrality metrics and top-K ranking
//!
//! Degree centrality is linear; betweenness and closeness run a BFS per
//! node and carry no internal timeout or sampling, so their cost on
//! multi-million node graphs is on the caller. Both parallelize over
//! source nodes with rayon.

use crate::error::QueryError;
use crate::graph::WeightedGraph;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::str::FromStr;

/// Node count past which an expensive metric logs a cost warning.
const EXPENSIVE_METRIC_WARN_NODES: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CentralityMetric {
    Degree,
    Betweenness,
    Closeness,
}

impl CentralityMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Degree => "degree",
            Self::Betweenness => "betweenness",
            Self::Closeness => "closeness",
        }
    }

    fn is_expensive(&self) -> bool {
        matches!(self, Self::Betweenness | Self::Closeness)
    }
}

impl FromStr for CentralityMetric {
    type Err = QueryError;

    fn from_str(name: &str) -> Result<Self, QueryError> {
        match name {
            "degree" => Ok(Self::Degree),
            "betweenness" => Ok(Self::Betweenness),
            "closeness" => Ok(Self::Closeness),
            other => Err(QueryError::InvalidArgument(other.to_string())),
        }
    }
}

/// Rank all nodes by the requested metric, descending, truncated to
/// `top`. Ties fall to the smaller author id.
pub fn rank(graph: &WeightedGraph, metric: CentralityMetric, top: usize) -> Vec<(u32, f64)> {
    if metric.is_expensive() && graph.node_count() > EXPENSIVE_METRIC_WARN_NODES {
        log::warn!(
            "{} centrality over {} nodes is unbounded in cost and may run for a very long time",
            metric.as_str(),
            graph.node_count()
        );
    }

    let scores = match metric {
        CentralityMetric::Degree => degree_centrality(graph),
        CentralityMetric::Betweenness => betweenness_centrality(graph),
        CentralityMetric::Closeness => closeness_centrality(graph),
    };

    let mut ranked: Vec<(u32, f64)> = scores
        .into_iter()
        .enumerate()
        .map(|(index, score)| (graph.id_at(index), score))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    ranked.truncate(top);
    ranked
}

/// Degree centrality: degree scaled by 1/(n-1). Every node of a graph
/// with at most one node scores 1.0.
fn degree_centrality(graph: &WeightedGraph) -> Vec<f64> {
    let n = graph.node_count();
    if n <= 1 {
        return vec![1.0; n];
    }
    let scale = 1.0 / (n as f64 - 1.0);
    (0..n).map(|index| graph.degree_at(index) as f64 * scale).collect()
}

/// Betweenness centrality via Brandes: one BFS plus dependency
/// back-propagation per source, accumulated over all sources and
/// normalized by 1/((n-1)(n-2)) for n > 2. Both traversal directions of
/// each pair contribute, which is the undirected normalized convention.
fn betweenness_centrality(graph: &WeightedGraph) -> Vec<f64> {
    let n = graph.node_count();
    if n == 0 {
        return Vec::new();
    }

    let mut centrality = (0..n)
        .into_par_iter()
        .map(|source| brandes_from(graph, source))
        .reduce(
            || vec![0.0; n],
            |mut acc, partial| {
                for (total, value) in acc.iter_mut().zip(partial) {
                    *total += value;
                }
                acc
            },
        );

    if n > 2 {
        let scale = 1.0 / ((n as f64 - 1.0) * (n as f64 - 2.0));
        for value in centrality.iter_mut() {
            *value *= scale;
        }
    }
    centrality
}

/// Single-source contribution of Brandes' algorithm.
fn brandes_from(graph: &WeightedGraph, source: usize) -> Vec<f64> {
    let n = graph.node_count();
    let mut stack = Vec::new();
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut sigma = vec![0.0_f64; n]; // number of shortest paths
    sigma[source] = 1.0;
    let mut dist = vec![-1_i64; n];
    dist[source] = 0;

    let mut queue = VecDeque::new();
    queue.push_back(source);

    // BFS phase
    while let Some(v) = queue.pop_front() {
        stack.push(v);
        for &w in graph.neighbor_indices_at(v) {
            let w = w as usize;
            if dist[w] < 0 {
                dist[w] = dist[v] + 1;
                queue.push_back(w);
            }
            if dist[w] == dist[v] + 1 {
                sigma[w] += sigma[v];
                predecessors[w].push(v);
            }
        }
    }

    // Back-propagation phase
    let mut delta = vec![0.0_f64; n];
    let mut partial = vec![0.0_f64; n];
    while let Some(w) = stack.pop() {
        for &v in &predecessors[w] {
            delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
        }
        if w != source {
            partial[w] += delta[w];
        }
    }
    partial
}

/// Closeness centrality, scaled by the reachable fraction: with `r`
/// nodes reachable from a node (itself included) and `s` the sum of
/// their distances, the score is (r-1)/s * (r-1)/(n-1), and 0.0 for
/// isolated nodes.
fn closeness_centrality(graph: &WeightedGraph) -> Vec<f64> {
    let n = graph.node_count();
    if n <= 1 {
        return vec![0.0; n];
    }

    (0..n)
        .into_par_iter()
        .map(|source| {
            let (reachable, total) = bfs_distances(graph, source);
            if total == 0 {
                return 0.0;
            }
            let r = reachable as f64 - 1.0;
            (r / total as f64) * (r / (n as f64 - 1.0))
        })
        .collect()
}

/// Reachable node count (including the source) and distance sum.
fn bfs_distances(graph: &WeightedGraph, source: usize) -> (usize, u64) {
    let n = graph.node_count();
    let mut dist = vec![-1_i64; n];
    dist[source] = 0;
    let mut reachable = 1usize;
    let mut total = 0u64;

    let mut queue = VecDeque::new();
    queue.push_back(source);
    while let Some(v) = queue.pop_front() {
        for &w in graph.neighbor_indices_at(v) {
            let w = w as usize;
            if dist[w] < 0 {
                dist[w] = dist[v] + 1;
                reachable += 1;
                total += dist[w] as u64;
                queue.push_back(w);
            }
        }
    }
    (reachable, total)
}
