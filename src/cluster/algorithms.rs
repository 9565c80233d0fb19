//! Partitioning algorithms
//!
//! Three strategies with different cost/quality tradeoffs: exact
//! connected components (union-find), greedy modularity maximization
//! (local moving), and seeded label propagation. All of them label every
//! node and are deterministic for a fixed graph: node visitation follows
//! dense order, label propagation draws its ordering from a fixed seed,
//! and ties always fall to the smaller label.

use crate::cluster::CommunityAssignment;
use crate::graph::WeightedGraph;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Local-moving passes before greedy modularity settles for the current
/// partition.
const MAX_MODULARITY_PASSES: usize = 10;

/// Recoverable failure raised by a partitioning algorithm. The detector
/// degrades through its fallback chain on any of these; nothing here
/// reaches a caller.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("did not converge within {0} iterations")]
    DidNotConverge(usize),

    #[error("degenerate graph: {0}")]
    Degenerate(&'static str),
}

/// Union-Find data structure for connected component analysis
pub struct DisjointSets {
    /// Parent pointers (parent[i] = parent of node i)
    parent: Vec<u32>,

    /// Rank of each set (for union by rank)
    rank: Vec<u32>,
}

impl DisjointSets {
    pub fn new(size: usize) -> Self {
        let mut parent = Vec::with_capacity(size);
        let mut rank = Vec::with_capacity(size);

        // Initialize each node as its own set
        for i in 0..size {
            parent.push(i as u32);
            rank.push(1);
        }

        Self { parent, rank }
    }

    /// Find the root of the set containing x with path compression
    pub fn find(&mut self, x: u32) -> u32 {
        let px = self.parent[x as usize];
        if px != x {
            // Path compression: set parent to root
            self.parent[x as usize] = self.find(px);
        }
        self.parent[x as usize]
    }

    /// Union the sets containing x and y
    pub fn union(&mut self, x: u32, y: u32) {
        let root_x = self.find(x);
        let root_y = self.find(y);

        if root_x == root_y {
            return; // Already in the same set
        }

        // Union by rank: attach smaller tree under root of larger tree
        let rank_x = self.rank[root_x as usize];
        let rank_y = self.rank[root_y as usize];

        if rank_x > rank_y {
            self.parent[root_y as usize] = root_x;
            self.rank[root_x as usize] += self.rank[root_y as usize];
        } else {
            self.parent[root_x as usize] = root_y;
            self.rank[root_y as usize] += self.rank[root_x as usize];
        }
    }
}

/// Exact partition into connected components.
pub fn connected_components(graph: &WeightedGraph) -> CommunityAssignment {
    let n = graph.node_count();
    let mut sets = DisjointSets::new(n);

    for index in 0..n {
        for &target in graph.neighbor_indices_at(index) {
            sets.union(index as u32, target);
        }
    }

    let mut labels = vec![0usize; n];
    for (index, label) in labels.iter_mut().enumerate() {
        *label = sets.find(index as u32) as usize;
    }
    renumber(&mut labels);

    to_assignment(graph, &labels)
}

/// Greedy modularity maximization by local moving: each node migrates to
/// the neighboring community with the best modularity gain until a full
/// pass moves nothing.
pub fn greedy_modularity(graph: &WeightedGraph) -> Result<CommunityAssignment, DetectError> {
    let n = graph.node_count();
    if n == 0 {
        return Ok(CommunityAssignment::new());
    }

    // Weighted degree per node; every edge is counted from both ends
    let mut k = vec![0.0_f64; n];
    for (index, degree) in k.iter_mut().enumerate() {
        *degree = graph.neighbor_weights_at(index).iter().map(|&w| w as f64).sum();
    }
    let two_m: f64 = k.iter().sum();
    if two_m == 0.0 {
        return Err(DetectError::Degenerate("graph has no edges"));
    }
    let m = two_m / 2.0;

    let mut community: Vec<usize> = (0..n).collect();
    // Total weighted degree per community, maintained incrementally
    let mut sigma_tot = k.clone();

    let mut moved = true;
    let mut passes = 0;
    while moved && passes < MAX_MODULARITY_PASSES {
        moved = false;
        passes += 1;

        for i in 0..n {
            let current = community[i];

            // Edge weight from i into each neighboring community,
            // in ascending community order for deterministic ties
            let mut community_weights: BTreeMap<usize, f64> = BTreeMap::new();
            let neighbors = graph.neighbor_indices_at(i);
            let weights = graph.neighbor_weights_at(i);
            for (&j, &w) in neighbors.iter().zip(weights) {
                *community_weights.entry(community[j as usize]).or_default() += w as f64;
            }

            // Detach i before evaluating candidates
            sigma_tot[current] -= k[i];

            let weight_to_current = community_weights.get(&current).copied().unwrap_or(0.0);
            let mut best = current;
            let mut best_gain =
                weight_to_current / m - k[i] * sigma_tot[current] / (2.0 * m * m);

            for (&candidate, &weight_to) in &community_weights {
                if candidate == current {
                    continue;
                }
                let gain = weight_to / m - k[i] * sigma_tot[candidate] / (2.0 * m * m);
                if gain > best_gain {
                    best_gain = gain;
                    best = candidate;
                }
            }

            sigma_tot[best] += k[i];
            if best != current {
                community[i] = best;
                moved = true;
            }
        }
    }

    renumber(&mut community);
    Ok(to_assignment(graph, &community))
}

/// Label propagation: every node repeatedly adopts the most frequent
/// label among its neighbors, in an order drawn from the seed, until a
/// full sweep changes nothing.
pub fn label_propagation(
    graph: &WeightedGraph,
    max_iters: usize,
    seed: u64,
) -> Result<CommunityAssignment, DetectError> {
    let n = graph.node_count();
    let mut labels: Vec<usize> = (0..n).collect();
    if n == 0 {
        return Ok(CommunityAssignment::new());
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut order: Vec<usize> = (0..n).collect();
    let mut converged = false;

    for _ in 0..max_iters {
        order.shuffle(&mut rng);
        let mut changed = false;

        for &node in &order {
            let neighbors = graph.neighbor_indices_at(node);
            if neighbors.is_empty() {
                continue;
            }

            let mut counts: HashMap<usize, usize> = HashMap::new();
            for &neighbor in neighbors {
                *counts.entry(labels[neighbor as usize]).or_insert(0) += 1;
            }

            // Highest count; tie-break by smallest label (deterministic)
            let mut best_label = labels[node];
            let mut best_count = 0usize;
            for (&label, &count) in &counts {
                if count > best_count || (count == best_count && label < best_label) {
                    best_label = label;
                    best_count = count;
                }
            }

            if best_label != labels[node] {
                labels[node] = best_label;
                changed = true;
            }
        }

        if !changed {
            converged = true;
            break;
        }
    }

    if !converged {
        return Err(DetectError::DidNotConverge(max_iters));
    }

    renumber(&mut labels);
    Ok(to_assignment(graph, &labels))
}

/// Renumber arbitrary labels to `0..k` in first-seen order.
fn renumber(labels: &mut [usize]) {
    let mut map: HashMap<usize, usize> = HashMap::new();
    let mut next = 0usize;
    for label in labels.iter_mut() {
        let id = *map.entry(*label).or_insert_with(|| {
            let current = next;
            next += 1;
            current
        });
        *label = id;
    }
}

/// Lift dense labels into an author-id keyed assignment.
fn to_assignment(graph: &WeightedGraph, labels: &[usize]) -> CommunityAssignment {
    labels
        .iter()
        .enumerate()
        .map(|(index, &label)| (graph.id_at(index), label as i32))
        .collect()
}
