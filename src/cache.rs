//! Byte-budgeted LRU cache of resized page images.
//!
//! **Why**: A resize takes tens to hundreds of milliseconds; paging back and
//! forth must not repeat it. Entries are keyed by `(page, width, height)`
//! because the same page at another viewport size is a different image.
//!
//! **Used by**: Scheduler (hit check + write-through on delivery), Workers
//! (read-only check to skip recomputation)
//!
//! # Concurrency
//!
//! Internally synchronized (`Mutex` around the LRU order, atomic byte
//! counter) so workers may *read* concurrently with the interactive thread.
//! Writes happen only on the scheduler's single delivery point.
//!
//! # Budget
//!
//! The byte budget is a soft target: inserting evicts least-recently-used
//! entries until usage fits, but a single entry larger than the whole budget
//! is still inserted (and evicts everything else).

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use log::debug;
use lru::LruCache;

/// Cache key: page index plus the viewport it was rendered for.
pub type PageKey = (usize, u32, u32);

/// Default byte budget: 64 MiB of resized JPEG output.
pub const DEFAULT_CACHE_BYTES: usize = 64 * 1024 * 1024;

struct CacheEntry {
    bytes: Arc<[u8]>,
}

/// LRU cache of resized page buffers with byte-size accounting.
pub struct PageCache {
    // Unbounded LRU; eviction is driven by the byte budget, not entry count
    entries: Mutex<LruCache<PageKey, CacheEntry>>,
    mem_used: AtomicUsize,
    budget: usize,
}

impl PageCache {
    /// Create a cache with the given byte budget.
    pub fn new(budget: usize) -> Self {
        Self {
            entries: Mutex::new(LruCache::unbounded()),
            mem_used: AtomicUsize::new(0),
            budget,
        }
    }

    /// Look up a resized page. A hit promotes the entry to most recently used.
    ///
    /// Absence is a normal outcome, not a failure.
    pub fn get(&self, key: &PageKey) -> Option<Arc<[u8]>> {
        let mut entries = self.entries.lock().unwrap();
        entries.get(key).map(|e| Arc::clone(&e.bytes))
    }

    /// Check for an entry without touching recency order.
    pub fn contains(&self, key: &PageKey) -> bool {
        let entries = self.entries.lock().unwrap();
        entries.peek(key).is_some()
    }

    /// Insert or replace an entry, then evict oldest entries until the byte
    /// budget holds. The entry just inserted is never the eviction victim.
    pub fn put(&self, key: PageKey, bytes: Arc<[u8]>) {
        let size = bytes.len();
        let mut entries = self.entries.lock().unwrap();

        // push returns the displaced old value when the key already exists
        if let Some((_, old)) = entries.push(key, CacheEntry { bytes }) {
            self.mem_used.fetch_sub(old.bytes.len(), Ordering::Relaxed);
        }
        self.mem_used.fetch_add(size, Ordering::Relaxed);

        while self.mem_used.load(Ordering::Relaxed) > self.budget && entries.len() > 1 {
            if let Some((evicted_key, evicted)) = entries.pop_lru() {
                self.mem_used
                    .fetch_sub(evicted.bytes.len(), Ordering::Relaxed);
                debug!(
                    "Evicted page {:?} ({} bytes, usage {}/{})",
                    evicted_key,
                    evicted.bytes.len(),
                    self.mem_used.load(Ordering::Relaxed),
                    self.budget
                );
            } else {
                break;
            }
        }
    }

    /// Drop every entry and reset accounting.
    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap();
        entries.clear();
        self.mem_used.store(0, Ordering::Relaxed);
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// True when the cache holds nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current usage and budget, in bytes.
    pub fn mem(&self) -> (usize, usize) {
        (self.mem_used.load(Ordering::Relaxed), self.budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes_of(len: usize) -> Arc<[u8]> {
        Arc::from(vec![0u8; len].into_boxed_slice())
    }

    /// Test: Byte budget is enforced
    /// Validates: Usage never exceeds budget after put (oversize aside)
    #[test]
    fn test_budget_enforced() {
        let cache = PageCache::new(100);
        for page in 0..10 {
            cache.put((page, 10, 10), bytes_of(30));
            let (used, budget) = cache.mem();
            assert!(used <= budget, "usage {} exceeds budget {}", used, budget);
        }
        assert_eq!(cache.len(), 3);
    }

    /// Test: LRU eviction order
    /// Validates: Capacity for two entries, inserting a third evicts the first
    #[test]
    fn test_lru_evicts_oldest() {
        let cache = PageCache::new(20);
        cache.put((0, 1, 1), bytes_of(10)); // A
        cache.put((1, 1, 1), bytes_of(10)); // B
        cache.put((2, 1, 1), bytes_of(10)); // C evicts A

        assert!(cache.get(&(0, 1, 1)).is_none());
        assert!(cache.get(&(1, 1, 1)).is_some());
        assert!(cache.get(&(2, 1, 1)).is_some());
    }

    /// Test: Recency promotion
    /// Validates: get() protects an entry from one eviction flood, not two
    #[test]
    fn test_get_promotes() {
        // Budget fits two entries
        let cache = PageCache::new(20);
        cache.put((0, 1, 1), bytes_of(10));
        cache.put((1, 1, 1), bytes_of(10));

        // Touch page 0 so page 1 becomes the LRU victim
        assert!(cache.get(&(0, 1, 1)).is_some());
        cache.put((2, 1, 1), bytes_of(10));
        assert!(cache.get(&(0, 1, 1)).is_some());
        assert!(cache.get(&(1, 1, 1)).is_none());

        // A second flood without touching page 0 evicts it
        cache.put((3, 1, 1), bytes_of(10));
        cache.put((4, 1, 1), bytes_of(10));
        assert!(cache.get(&(0, 1, 1)).is_none());
    }

    /// Test: Oversized single entry
    /// Validates: Inserted despite exceeding the whole budget; everything else evicted
    #[test]
    fn test_oversized_entry_still_inserted() {
        let cache = PageCache::new(20);
        cache.put((0, 1, 1), bytes_of(10));
        cache.put((1, 1, 1), bytes_of(100));

        assert!(cache.get(&(1, 1, 1)).is_some());
        assert!(cache.get(&(0, 1, 1)).is_none());
        assert_eq!(cache.len(), 1);
    }

    /// Test: Replacing a key updates accounting
    #[test]
    fn test_replace_same_key() {
        let cache = PageCache::new(100);
        cache.put((0, 1, 1), bytes_of(40));
        cache.put((0, 1, 1), bytes_of(10));
        let (used, _) = cache.mem();
        assert_eq!(used, 10);
        assert_eq!(cache.len(), 1);
    }

    /// Test: contains() does not promote
    #[test]
    fn test_contains_does_not_promote() {
        let cache = PageCache::new(20);
        cache.put((0, 1, 1), bytes_of(10));
        cache.put((1, 1, 1), bytes_of(10));

        assert!(cache.contains(&(0, 1, 1)));
        cache.put((2, 1, 1), bytes_of(10));
        // Page 0 was peeked, not touched, so it is still the eviction victim
        assert!(cache.get(&(0, 1, 1)).is_none());
    }

    #[test]
    fn test_clear() {
        let cache = PageCache::new(100);
        cache.put((0, 1, 1), bytes_of(10));
        cache.put((1, 1, 1), bytes_of(10));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.mem().0, 0);
    }
}
