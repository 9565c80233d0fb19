//! Memory-efficient weighted graph representation

use std::collections::{HashMap, HashSet};

/// Compressed sparse representation of an undirected weighted graph.
///
/// Nodes are author ids mapped onto dense indices; dense order is
/// ascending author id, and induced subgraphs preserve it. Every
/// undirected edge is stored in both endpoint adjacency lists, each
/// sorted by dense index so edge lookup is a binary search.
#[derive(Debug, Clone)]
pub struct WeightedGraph {
    /// Author id for each dense index
    node_ids: Vec<u32>,

    /// Reverse mapping from author id to dense index
    id_to_index: HashMap<u32, u32>,

    /// Offset array: offsets[i] to offsets[i+1] delimits node i's adjacency
    offsets: Vec<u32>,

    /// Dense neighbor indices, sorted within each node's range
    targets: Vec<u32>,

    /// Edge weights parallel to `targets`
    weights: Vec<u32>,
}

impl WeightedGraph {
    /// Assemble a graph from finished CSR arrays.
    pub(crate) fn from_csr(
        node_ids: Vec<u32>,
        offsets: Vec<u32>,
        targets: Vec<u32>,
        weights: Vec<u32>,
    ) -> Self {
        let id_to_index = node_ids
            .iter()
            .enumerate()
            .map(|(index, &id)| (id, index as u32))
            .collect();

        Self {
            node_ids,
            id_to_index,
            offsets,
            targets,
            weights,
        }
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.node_ids.len()
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.targets.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.node_ids.is_empty()
    }

    /// Whether the author is a node of this graph
    pub fn contains(&self, author: u32) -> bool {
        self.id_to_index.contains_key(&author)
    }

    /// Author ids in dense (ascending) order
    pub fn nodes(&self) -> impl Iterator<Item = u32> + '_ {
        self.node_ids.iter().copied()
    }

    /// Dense index of an author id
    pub fn index_of(&self, author: u32) -> Option<usize> {
        self.id_to_index.get(&author).map(|&index| index as usize)
    }

    /// Author id at a dense index
    pub fn id_at(&self, index: usize) -> u32 {
        self.node_ids[index]
    }

    fn range(&self, index: usize) -> std::ops::Range<usize> {
        self.offsets[index] as usize..self.offsets[index + 1] as usize
    }

    /// Neighbor dense indices of the node at a dense index
    pub fn neighbor_indices_at(&self, index: usize) -> &[u32] {
        &self.targets[self.range(index)]
    }

    /// Neighbor edge weights of the node at a dense index
    pub fn neighbor_weights_at(&self, index: usize) -> &[u32] {
        &self.weights[self.range(index)]
    }

    /// Degree of the node at a dense index
    pub fn degree_at(&self, index: usize) -> usize {
        self.range(index).len()
    }

    /// Degree of an author, if present
    pub fn degree(&self, author: u32) -> Option<usize> {
        self.index_of(author).map(|index| self.degree_at(index))
    }

    /// Neighbors of an author as (author id, weight) pairs
    pub fn neighbors(&self, author: u32) -> Option<impl Iterator<Item = (u32, u32)> + '_> {
        let index = self.index_of(author)?;
        let pairs = self
            .neighbor_indices_at(index)
            .iter()
            .zip(self.neighbor_weights_at(index))
            .map(move |(&target, &weight)| (self.node_ids[target as usize], weight));
        Some(pairs)
    }

    /// Weight of the edge between two authors, if both exist and are connected
    pub fn edge_weight(&self, a: u32, b: u32) -> Option<u32> {
        let index_a = self.index_of(a)?;
        let index_b = self.index_of(b)? as u32;
        let range = self.range(index_a);
        let position = self.targets[range.clone()].binary_search(&index_b).ok()?;
        Some(self.weights[range.start + position])
    }

    /// Every undirected edge exactly once, as (author, author, weight)
    /// with the smaller author id first.
    pub fn edges(&self) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
        (0..self.node_count()).flat_map(move |source| {
            let range = self.range(source);
            self.targets[range.clone()]
                .iter()
                .zip(&self.weights[range])
                .filter(move |(&target, _)| target as usize > source)
                .map(move |(&target, &weight)| {
                    (self.node_ids[source], self.node_ids[target as usize], weight)
                })
        })
    }

    /// Induce the subgraph on a node subset: only the selected nodes and
    /// the original edges whose both endpoints are selected. Selected
    /// nodes with no surviving edge are kept as isolated nodes. Edge
    /// weights are carried over unchanged.
    pub fn induced_subgraph(&self, keep: &HashSet<u32>) -> WeightedGraph {
        let selected: Vec<usize> =
            (0..self.node_count()).filter(|&index| keep.contains(&self.node_ids[index])).collect();

        let mut old_to_new = vec![u32::MAX; self.node_count()];
        for (new_index, &old_index) in selected.iter().enumerate() {
            old_to_new[old_index] = new_index as u32;
        }

        // First pass: count surviving edges
        let mut edge_slots = 0;
        for &old_index in &selected {
            for &target in self.neighbor_indices_at(old_index) {
                if old_to_new[target as usize] != u32::MAX {
                    edge_slots += 1;
                }
            }
        }

        // Second pass: fill offsets, targets and weights
        let mut offsets = Vec::with_capacity(selected.len() + 1);
        offsets.push(0);
        let mut targets = Vec::with_capacity(edge_slots);
        let mut weights = Vec::with_capacity(edge_slots);
        let mut offset = 0u32;

        for &old_index in &selected {
            let range = self.range(old_index);
            for (&target, &weight) in self.targets[range.clone()].iter().zip(&self.weights[range]) {
                let new_target = old_to_new[target as usize];
                if new_target != u32::MAX {
                    targets.push(new_target);
                    weights.push(weight);
                    offset += 1;
                }
            }
            offsets.push(offset);
        }

        let node_ids = selected.iter().map(|&index| self.node_ids[index]).collect();
        WeightedGraph::from_csr(node_ids, offsets, targets, weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    fn triangle_with_tail() -> WeightedGraph {
        // 1-2 (weight 2), 1-3, 2-3, 3-4
        let mut builder = GraphBuilder::new();
        builder.add_publication(&[1, 2, 3]);
        builder.add_publication(&[1, 2]);
        builder.add_publication(&[3, 4]);
        builder.build()
    }

    #[test]
    fn counts_and_membership() {
        let graph = triangle_with_tail();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 4);
        assert!(graph.contains(4));
        assert!(!graph.contains(99));
    }

    #[test]
    fn edge_weight_lookup() {
        let graph = triangle_with_tail();
        assert_eq!(graph.edge_weight(1, 2), Some(2));
        assert_eq!(graph.edge_weight(2, 1), Some(2));
        assert_eq!(graph.edge_weight(1, 3), Some(1));
        assert_eq!(graph.edge_weight(1, 4), None);
        assert_eq!(graph.edge_weight(1, 99), None);
    }

    #[test]
    fn edges_enumerated_once_with_smaller_id_first() {
        let graph = triangle_with_tail();
        let edges: Vec<(u32, u32, u32)> = graph.edges().collect();
        assert_eq!(edges, vec![(1, 2, 2), (1, 3, 1), (2, 3, 1), (3, 4, 1)]);
    }

    #[test]
    fn induced_subgraph_keeps_isolated_nodes_and_weights() {
        let graph = triangle_with_tail();
        let keep: HashSet<u32> = [1, 2, 4].into_iter().collect();
        let sub = graph.induced_subgraph(&keep);

        assert_eq!(sub.node_count(), 3);
        assert_eq!(sub.edge_count(), 1);
        assert_eq!(sub.edge_weight(1, 2), Some(2));
        // 4 lost its only neighbor but stays as an isolated node
        assert_eq!(sub.degree(4), Some(0));
    }

    #[test]
    fn induced_subgraph_ignores_unknown_ids() {
        let graph = triangle_with_tail();
        let keep: HashSet<u32> = [3, 4, 1000].into_iter().collect();
        let sub = graph.induced_subgraph(&keep);
        assert_eq!(sub.node_count(), 2);
        assert_eq!(sub.edge_weight(3, 4), Some(1));
    }
}
