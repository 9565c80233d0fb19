//! Community partitioning and cluster-level aggregation

pub mod aggregate;
pub mod algorithms;
pub mod cache;
pub mod detection;

use std::collections::HashMap;

/// Cluster id for members of communities below the retained-size
/// threshold.
pub const CATCH_ALL_CLUSTER: i32 = -1;

/// Mapping from author id to community label
pub type CommunityAssignment = HashMap<u32, i32>;

pub use aggregate::{Aggregation, Aggregator, ClusterLink, ClusterSummary};
pub use cache::{BoundedDetectionCache, DetectionCache};
pub use detection::{CommunityDetector, GraphFingerprint};
