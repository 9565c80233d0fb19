//! Shared cache for community partitions

use crate::cluster::detection::GraphFingerprint;
use crate::cluster::CommunityAssignment;
use dashmap::DashMap;
use std::sync::Arc;

/// Cache of community partitions keyed by graph fingerprint.
///
/// One instance is shared across all queries of a service, including
/// concurrent ones: `insert` must behave as an atomic insert-if-absent
/// so two racing queries settle on a single mapping.
pub trait DetectionCache: Send + Sync {
    /// Look up a previously computed partition.
    fn get(&self, key: &GraphFingerprint) -> Option<Arc<CommunityAssignment>>;

    /// Insert if absent and return the entry that won; callers must use
    /// the returned mapping in place of the one they computed.
    fn insert(
        &self,
        key: GraphFingerprint,
        value: Arc<CommunityAssignment>,
    ) -> Arc<CommunityAssignment>;

    /// Number of cached partitions.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bounded in-memory cache over a concurrent map.
///
/// When an insert would grow the cache past its capacity, the whole map
/// is flushed first; insert-if-absent stays a single atomic entry
/// operation.
pub struct BoundedDetectionCache {
    entries: DashMap<GraphFingerprint, Arc<CommunityAssignment>>,
    capacity: usize,
}

impl BoundedDetectionCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
        }
    }
}

impl DetectionCache for BoundedDetectionCache {
    fn get(&self, key: &GraphFingerprint) -> Option<Arc<CommunityAssignment>> {
        self.entries.get(key).map(|entry| Arc::clone(entry.value()))
    }

    fn insert(
        &self,
        key: GraphFingerprint,
        value: Arc<CommunityAssignment>,
    ) -> Arc<CommunityAssignment> {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            log::debug!(
                "community cache reached capacity {}, flushing",
                self.capacity
            );
            self.entries.clear();
        }
        let entry = self.entries.entry(key).or_insert(value);
        Arc::clone(entry.value())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
