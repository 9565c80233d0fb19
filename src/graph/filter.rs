//! Filtered subgraph derivation

use crate::error::QueryError;
use crate::graph::store::{GraphStore, Publication};
use crate::graph::WeightedGraph;
use std::borrow::Cow;
use std::collections::HashSet;

/// Filter parameters deriving a query-local view of the base graph.
///
/// Up to three filters apply in sequence, each operating on the result
/// of the previous one: year range, venue substring, top-N degree
/// limiting. With no filters the base graph is returned by reference.
///
/// Induced edges keep their full original weight even when only part of
/// that weight falls inside the year/venue selection. This approximation
/// is part of the contract and must not be corrected here.
#[derive(Debug, Clone, Default)]
pub struct ViewFilter {
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub venue: Option<String>,
    pub limit: Option<usize>,
}

impl ViewFilter {
    /// Derive the filtered view.
    ///
    /// Fails with the soft `EmptyResult` when a positive limit is
    /// requested but the preceding filters already matched nothing.
    pub fn apply<'a>(&self, store: &'a GraphStore) -> Result<Cow<'a, WeightedGraph>, QueryError> {
        let mut view: Cow<'a, WeightedGraph> = Cow::Borrowed(store.graph());

        if self.year_from.is_some() || self.year_to.is_some() {
            view = Cow::Owned(filter_by_years(store, &view, self.year_from, self.year_to));
        }

        if let Some(venue) = self.venue.as_deref() {
            if !venue.is_empty() {
                view = Cow::Owned(filter_by_venue(store, &view, venue));
            }
        }

        if let Some(limit) = self.limit {
            if limit > 0 {
                if view.node_count() == 0 {
                    return Err(QueryError::EmptyResult);
                }
                view = Cow::Owned(limit_by_degree(&view, limit));
            }
        }

        Ok(view)
    }
}

/// Union of the author sets of all publications matching the predicate.
fn relevant_authors<F>(store: &GraphStore, matches: F) -> HashSet<u32>
where
    F: Fn(&Publication) -> bool,
{
    let mut authors = HashSet::new();
    for (publication, attrs) in store.publications() {
        if matches(attrs) {
            authors.extend(store.publication_authors(publication).iter().copied());
        }
    }
    authors
}

/// Keep the authors of publications inside the (optionally one-sided)
/// year range and induce the subgraph on them.
fn filter_by_years(
    store: &GraphStore,
    graph: &WeightedGraph,
    year_from: Option<i32>,
    year_to: Option<i32>,
) -> WeightedGraph {
    let keep = relevant_authors(store, |publication| {
        year_from.map_or(true, |from| publication.year >= from)
            && year_to.map_or(true, |to| publication.year <= to)
    });
    graph.induced_subgraph(&keep)
}

/// Keep the authors of publications whose venue contains the query
/// text, case-insensitively, and induce the subgraph on them.
fn filter_by_venue(store: &GraphStore, graph: &WeightedGraph, venue: &str) -> WeightedGraph {
    let needle = venue.to_lowercase();
    let keep = relevant_authors(store, |publication| {
        publication.venue.to_lowercase().contains(&needle)
    });
    graph.induced_subgraph(&keep)
}

/// Keep the `limit` highest-degree nodes of the current view. Ties fall
/// to the smaller author id.
fn limit_by_degree(graph: &WeightedGraph, limit: usize) -> WeightedGraph {
    let mut ranked: Vec<(u32, usize)> = (0..graph.node_count())
        .map(|index| (graph.id_at(index), graph.degree_at(index)))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let keep: HashSet<u32> = ranked.into_iter().take(limit).map(|(id, _)| id).collect();
    graph.induced_subgraph(&keep)
}
