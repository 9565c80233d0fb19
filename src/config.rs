//! Configuration defaults for the query engine

/// Default configuration for the query engine
#[derive(Debug, Clone)]
pub struct Config {
    /// Communities below this size are pooled into the catch-all cluster
    pub min_cluster_size: usize,

    /// Default number of entries in a centrality ranking
    pub centrality_top: usize,

    /// Maximum number of community partitions kept in the detection cache
    pub cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_cluster_size: 3,
            centrality_top: 50,
            cache_capacity: 64,
        }
    }
}

impl Config {
    /// Create a new configuration with custom values
    pub fn new(min_cluster_size: usize, centrality_top: usize, cache_capacity: usize) -> Self {
        Self {
            min_cluster_size,
            centrality_top,
            cache_capacity,
        }
    }
}
