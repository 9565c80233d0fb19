//! Error taxonomy for query operations

use thiserror::Error;

/// Failure modes surfaced by [`crate::service::QueryService`] operations.
///
/// `EmptyResult` is a soft condition: the query was well-formed and the
/// service is healthy, but the filters matched nothing. Transports may
/// render it as an empty success body instead of a failure.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The coauthorship graph was never loaded.
    #[error("coauthorship graph is not loaded")]
    ServiceUnavailable,

    /// An author, node, or cluster id is unknown.
    #[error("{0} not found")]
    NotFound(String),

    /// An unrecognized centrality metric name.
    #[error("unknown metric: {0}")]
    InvalidArgument(String),

    /// The filters matched nothing.
    #[error("graph is empty after filtering")]
    EmptyResult,
}

impl QueryError {
    /// Build a `NotFound` for an author id.
    pub fn author_not_found(id: u32) -> Self {
        Self::NotFound(format!("author {id}"))
    }

    /// Build a `NotFound` for a cluster id.
    pub fn cluster_not_found(id: i32) -> Self {
        Self::NotFound(format!("cluster {id}"))
    }

    /// True for the soft no-data condition, false for real failures.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, Self::EmptyResult)
    }
}
