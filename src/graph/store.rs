//! Immutable graph store with author and publication side tables

use crate::data::Dataset;
use crate::error::QueryError;
use crate::graph::{GraphBuilder, WeightedGraph};
use std::collections::HashMap;

/// Publication attributes kept for filtering and node info
#[derive(Debug, Clone)]
pub struct Publication {
    pub title: String,
    pub year: i32,
    pub venue: String,
    pub kind: String,
}

/// The base coauthorship graph plus its side tables, built once at
/// startup and read-only afterwards.
///
/// The graph only contains authors with at least one coauthorship; the
/// author table contains every ingested author, so an author can be
/// known here without being a graph node.
pub struct GraphStore {
    graph: WeightedGraph,
    authors: HashMap<u32, String>,
    publications: HashMap<u32, Publication>,
    author_pubs: HashMap<u32, Vec<u32>>,
    pub_authors: HashMap<u32, Vec<u32>>,
}

impl GraphStore {
    /// Build the store from ingested records: every publication
    /// increments the weight of each unordered pair of its authors.
    pub fn from_dataset(dataset: Dataset) -> Self {
        let mut authors = HashMap::with_capacity(dataset.authors.len());
        for record in dataset.authors {
            authors.insert(record.id, record.name);
        }

        let mut publications = HashMap::with_capacity(dataset.publications.len());
        for record in dataset.publications {
            publications.insert(
                record.id,
                Publication {
                    title: record.title,
                    year: record.year,
                    venue: record.venue,
                    kind: record.kind,
                },
            );
        }

        let mut author_pubs: HashMap<u32, Vec<u32>> = HashMap::new();
        let mut pub_authors: HashMap<u32, Vec<u32>> = HashMap::new();
        for link in &dataset.authorship {
            author_pubs.entry(link.author).or_default().push(link.publication);
            pub_authors.entry(link.publication).or_default().push(link.author);
        }

        let mut builder = GraphBuilder::new();
        for members in pub_authors.values() {
            builder.add_publication(members);
        }
        let graph = builder.build();

        log::info!(
            "Built coauthorship graph with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        Self {
            graph,
            authors,
            publications,
            author_pubs,
            pub_authors,
        }
    }

    /// The base coauthorship graph
    pub fn graph(&self) -> &WeightedGraph {
        &self.graph
    }

    pub fn author_count(&self) -> usize {
        self.authors.len()
    }

    pub fn publication_count(&self) -> usize {
        self.publications.len()
    }

    /// Whether the author appears in the author side table
    pub fn contains_author(&self, author: u32) -> bool {
        self.authors.contains_key(&author)
    }

    pub fn author_name(&self, author: u32) -> Option<&str> {
        self.authors.get(&author).map(String::as_str)
    }

    /// Display name with the placeholder fallback for unnamed ids
    pub fn display_name(&self, author: u32) -> String {
        match self.authors.get(&author) {
            Some(name) => name.clone(),
            None => format!("Author_{author}"),
        }
    }

    pub fn publication(&self, publication: u32) -> Option<&Publication> {
        self.publications.get(&publication)
    }

    /// All publications with their attributes
    pub fn publications(&self) -> impl Iterator<Item = (u32, &Publication)> {
        self.publications.iter().map(|(&id, attrs)| (id, attrs))
    }

    /// Publication ids of an author (empty when unknown)
    pub fn author_publications(&self, author: u32) -> &[u32] {
        self.author_pubs.get(&author).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Author ids of a publication (empty when unknown)
    pub fn publication_authors(&self, publication: u32) -> &[u32] {
        self.pub_authors.get(&publication).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Coauthors of a graph node as (author id, collaboration count).
    /// Fails with `NotFound` when the id is not a node of the graph.
    pub fn neighbors(&self, author: u32) -> Result<Vec<(u32, u32)>, QueryError> {
        self.graph
            .neighbors(author)
            .map(Iterator::collect)
            .ok_or_else(|| QueryError::author_not_found(author))
    }

    /// Degree of a graph node, `NotFound` when the id is not a node.
    pub fn degree(&self, author: u32) -> Result<usize, QueryError> {
        self.graph
            .degree(author)
            .ok_or_else(|| QueryError::author_not_found(author))
    }

    /// Edge weight between two graph nodes; `Ok(None)` when both exist
    /// but never collaborated, `NotFound` when either id is unknown.
    pub fn edge_weight(&self, a: u32, b: u32) -> Result<Option<u32>, QueryError> {
        if !self.graph.contains(a) {
            return Err(QueryError::author_not_found(a));
        }
        if !self.graph.contains(b) {
            return Err(QueryError::author_not_found(b));
        }
        Ok(self.graph.edge_weight(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AuthorRecord, AuthorshipRecord, PublicationRecord};

    fn record(id: u32, year: i32, venue: &str) -> PublicationRecord {
        PublicationRecord {
            id,
            title: format!("Paper {id}"),
            year,
            venue: venue.to_string(),
            kind: "article".to_string(),
        }
    }

    fn small_store() -> GraphStore {
        let dataset = Dataset {
            authors: vec![
                AuthorRecord { id: 1, name: "Ada".into() },
                AuthorRecord { id: 2, name: "Bob".into() },
                AuthorRecord { id: 3, name: "Carol".into() },
                AuthorRecord { id: 4, name: "Dan".into() },
            ],
            publications: vec![record(100, 2020, "ICSE"), record(101, 2021, "FSE")],
            authorship: vec![
                AuthorshipRecord { publication: 100, author: 1 },
                AuthorshipRecord { publication: 100, author: 2 },
                AuthorshipRecord { publication: 101, author: 1 },
                AuthorshipRecord { publication: 101, author: 2 },
                AuthorshipRecord { publication: 101, author: 3 },
            ],
        };
        GraphStore::from_dataset(dataset)
    }

    #[test]
    fn builds_weighted_graph_from_publications() {
        let store = small_store();
        assert_eq!(store.graph().node_count(), 3);
        assert_eq!(store.edge_weight(1, 2).unwrap(), Some(2));
        assert_eq!(store.edge_weight(1, 3).unwrap(), Some(1));
    }

    #[test]
    fn unknown_node_queries_fail_with_not_found() {
        let store = small_store();
        // author 4 is ingested but has no coauthorship, so it is not a node
        assert!(store.contains_author(4));
        assert!(matches!(store.degree(4), Err(QueryError::NotFound(_))));
        assert!(matches!(store.neighbors(999), Err(QueryError::NotFound(_))));
        assert!(matches!(store.edge_weight(1, 999), Err(QueryError::NotFound(_))));
    }

    #[test]
    fn display_name_falls_back_to_placeholder() {
        let store = small_store();
        assert_eq!(store.display_name(1), "Ada");
        assert_eq!(store.display_name(999), "Author_999");
    }

    #[test]
    fn side_tables_are_linked_both_ways() {
        let store = small_store();
        assert_eq!(store.author_publications(1), &[100, 101]);
        assert_eq!(store.publication_authors(101), &[1, 2, 3]);
        assert_eq!(store.author_count(), 4);
        assert_eq!(store.publication_count(), 2);
    }
}
