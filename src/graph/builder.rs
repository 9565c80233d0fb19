//! Graph construction from publication author lists

use crate::graph::WeightedGraph;
use itertools::Itertools;
use std::collections::HashMap;

/// Builder accumulating coauthorship weights before freezing them into
/// the compressed representation.
///
/// Every publication contributes one weight unit to each unordered pair
/// of its authors. Self-pairs are skipped and repeated author entries on
/// one publication are deduplicated, so the result carries no self-loops
/// and no duplicate edges.
#[derive(Default)]
pub struct GraphBuilder {
    /// Accumulated weight per unordered pair, keyed as (smaller, larger)
    pair_weights: HashMap<(u32, u32), u32>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one shared publication between two authors.
    pub fn add_collaboration(&mut self, a: u32, b: u32) {
        if a == b {
            return;
        }
        let key = (a.min(b), a.max(b));
        *self.pair_weights.entry(key).or_insert(0) += 1;
    }

    /// Record a publication: one collaboration per unordered author pair.
    pub fn add_publication(&mut self, authors: &[u32]) {
        let mut unique = authors.to_vec();
        unique.sort_unstable();
        unique.dedup();

        for (a, b) in unique.into_iter().tuple_combinations() {
            self.add_collaboration(a, b);
        }
    }

    /// Freeze the accumulated pairs into CSR form, nodes ascending by id.
    pub fn build(self) -> WeightedGraph {
        let mut node_ids: Vec<u32> = self
            .pair_weights
            .keys()
            .flat_map(|&(a, b)| [a, b])
            .collect();
        node_ids.sort_unstable();
        node_ids.dedup();

        let id_to_index: HashMap<u32, u32> = node_ids
            .iter()
            .enumerate()
            .map(|(index, &id)| (id, index as u32))
            .collect();

        let mut adjacency: Vec<Vec<(u32, u32)>> = vec![Vec::new(); node_ids.len()];
        for (&(a, b), &weight) in &self.pair_weights {
            let index_a = id_to_index[&a];
            let index_b = id_to_index[&b];
            adjacency[index_a as usize].push((index_b, weight));
            adjacency[index_b as usize].push((index_a, weight));
        }

        let edge_slots = self.pair_weights.len() * 2;
        let mut offsets = Vec::with_capacity(node_ids.len() + 1);
        offsets.push(0);
        let mut targets = Vec::with_capacity(edge_slots);
        let mut weights = Vec::with_capacity(edge_slots);
        let mut offset = 0u32;

        for list in &mut adjacency {
            // Sort for binary search efficiency
            list.sort_unstable_by_key(|&(target, _)| target);
            for &(target, weight) in list.iter() {
                targets.push(target);
                weights.push(weight);
                offset += 1;
            }
            offsets.push(offset);
        }

        WeightedGraph::from_csr(node_ids, offsets, targets, weights)
    }
}
