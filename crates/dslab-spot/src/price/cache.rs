//! Bounded cache of built price timelines.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use log::trace;

use crate::price::interval::PriceInterval;

/// Identity of a price trace: format name and (canonical) path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TraceKey {
    pub format: String,
    pub path: PathBuf,
}

impl TraceKey {
    pub fn new(format: &str, path: &Path) -> Self {
        Self {
            format: format.to_string(),
            path: path.canonicalize().unwrap_or_else(|_| path.to_path_buf()),
        }
    }
}

/// Least-recently-used cache with fixed capacity.
///
/// Entries are kept in recency order: the front of the map is the least recently used entry,
/// which is the one evicted when a new entry does not fit.
pub struct PriceCache {
    capacity: usize,
    entries: IndexMap<TraceKey, Arc<[PriceInterval]>>,
}

impl PriceCache {
    /// Creates a cache holding at most `capacity` timelines. Zero capacity disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: IndexMap::with_capacity(capacity),
        }
    }

    /// Returns the cached timeline and marks it as most recently used.
    pub fn get(&mut self, key: &TraceKey) -> Option<Arc<[PriceInterval]>> {
        let timeline = self.entries.shift_remove(key)?;
        self.entries.insert(key.clone(), timeline.clone());
        Some(timeline)
    }

    /// Stores the timeline, evicting least recently used entries if the cache is full.
    pub fn insert(&mut self, key: TraceKey, timeline: Arc<[PriceInterval]>) {
        if self.capacity == 0 {
            return;
        }
        self.entries.shift_remove(&key);
        while self.entries.len() >= self.capacity {
            if let Some((evicted, _)) = self.entries.shift_remove_index(0) {
                trace!("evicted price timeline {}", evicted.path.display());
            }
        }
        self.entries.insert(key, timeline);
    }

    pub fn contains(&self, key: &TraceKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> TraceKey {
        TraceKey::new("csv", Path::new(name))
    }

    fn timeline(price: f64) -> Arc<[PriceInterval]> {
        vec![PriceInterval::new(i64::MIN, i64::MAX, price, price / 2.)].into()
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let mut cache = PriceCache::new(2);
        cache.insert(key("a"), timeline(1.));
        cache.insert(key("b"), timeline(2.));
        // touch "a" so that "b" becomes the eviction candidate
        assert!(cache.get(&key("a")).is_some());
        cache.insert(key("c"), timeline(3.));

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&key("a")));
        assert!(!cache.contains(&key("b")));
        assert!(cache.contains(&key("c")));
    }

    #[test]
    fn test_reinsert_does_not_grow() {
        let mut cache = PriceCache::new(2);
        cache.insert(key("a"), timeline(1.));
        cache.insert(key("a"), timeline(5.));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key("a")).unwrap()[0].on_demand_price, 5.);
    }

    #[test]
    fn test_zero_capacity() {
        let mut cache = PriceCache::new(0);
        cache.insert(key("a"), timeline(1.));
        assert!(cache.is_empty());
        assert!(cache.get(&key("a")).is_none());
    }

    #[test]
    fn test_clear() {
        let mut cache = PriceCache::new(4);
        cache.insert(key("a"), timeline(1.));
        cache.insert(key("b"), timeline(1.));
        cache.clear();
        assert!(cache.is_empty());
    }
}
