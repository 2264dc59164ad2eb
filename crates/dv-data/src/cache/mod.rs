//! Per-table cache of derived column facts

use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;

use crate::column::ColumnSummary;

/// Column summaries of one table instance, keyed by column slug
///
/// Each table owns its own cache; filtered tables start empty.
#[derive(Debug, Default)]
pub struct DerivedCache {
    summaries: Arc<RwLock<AHashMap<String, Arc<ColumnSummary>>>>,
}

impl DerivedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a summary from cache
    pub fn get(&self, slug: &str) -> Option<Arc<ColumnSummary>> {
        self.summaries.read().get(slug).cloned()
    }

    /// Cached summary for `slug`, computing it on a miss
    ///
    /// The computation runs without holding the lock; when two readers race,
    /// the first stored summary wins.
    pub fn get_or_insert_with<F>(&self, slug: &str, compute: F) -> Arc<ColumnSummary>
    where
        F: FnOnce() -> ColumnSummary,
    {
        if let Some(summary) = self.get(slug) {
            return summary;
        }

        let summary = Arc::new(compute());
        self.summaries
            .write()
            .entry(slug.to_string())
            .or_insert(summary)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.summaries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.read().is_empty()
    }

    /// Clear the cache
    pub fn clear(&self) {
        self.summaries.write().clear();
    }
}
