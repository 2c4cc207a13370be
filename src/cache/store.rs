//! Single-flight plan cache with bulk insertion-order eviction

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

use super::fingerprint::Fingerprint;

pub const DEFAULT_CAPACITY: usize = 100;
pub const DEFAULT_EVICT_BATCH: usize = 20;

/// Statistics about cache usage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Current number of entries in cache
    pub entries: usize,
    /// Entries removed by eviction since construction
    pub evictions: u64,
}

impl CacheStats {
    /// Hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

struct Entries<V> {
    cells: HashMap<Fingerprint, Arc<OnceCell<V>>>,
    /// Fingerprints in insertion order, oldest first
    order: VecDeque<Fingerprint>,
}

/// Memoizes values per fingerprint.
///
/// When the entry count exceeds `capacity` the oldest `evict_batch` entries
/// (by insertion, not by use) are dropped in one go. Callers must not assume
/// recently used entries survive.
pub struct PlanCache<V> {
    entries: Mutex<Entries<V>>,
    capacity: usize,
    evict_batch: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<V: Clone> PlanCache<V> {
    pub fn new(capacity: usize, evict_batch: usize) -> Self {
        Self {
            entries: Mutex::new(Entries {
                cells: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
            evict_batch: evict_batch.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_EVICT_BATCH)
    }

    /// Return the cached value for `key`, computing it if absent.
    ///
    /// Exactly one caller runs `compute` per fingerprint; concurrent callers
    /// for the same key wait for that result. The flag is `true` when this
    /// caller did not run the computation.
    pub async fn get_or_compute<F>(&self, key: &Fingerprint, compute: F) -> (V, bool)
    where
        F: FnOnce() -> V,
    {
        let cell = self.cell_for(key).await;

        let mut computed = false;
        let value = cell
            .get_or_init(|| {
                computed = true;
                let value = compute();
                async move { value }
            })
            .await
            .clone();

        if computed {
            self.misses.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(fingerprint = %key, "Plan cache miss");
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(fingerprint = %key, "Plan cache hit");
        }

        (value, !computed)
    }

    /// Cached value, if one has been computed
    pub async fn get(&self, key: &Fingerprint) -> Option<V> {
        let entries = self.entries.lock().await;
        entries.cells.get(key).and_then(|cell| cell.get().cloned())
    }

    pub async fn contains(&self, key: &Fingerprint) -> bool {
        self.get(key).await.is_some()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.cells.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.lock().await;
        entries.cells.clear();
        entries.order.clear();
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len().await,
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    async fn cell_for(&self, key: &Fingerprint) -> Arc<OnceCell<V>> {
        let mut entries = self.entries.lock().await;
        if let Some(cell) = entries.cells.get(key) {
            return Arc::clone(cell);
        }

        let cell = Arc::new(OnceCell::new());
        entries.cells.insert(key.clone(), Arc::clone(&cell));
        entries.order.push_back(key.clone());

        if entries.cells.len() > self.capacity {
            // The entry just inserted sits at the back and is never evicted
            let mut evicted = 0;
            while evicted < self.evict_batch && entries.order.len() > 1 {
                if let Some(oldest) = entries.order.pop_front() {
                    entries.cells.remove(&oldest);
                    evicted += 1;
                }
            }
            self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
            tracing::debug!(evicted, remaining = entries.cells.len(), "Plan cache evicted oldest entries");
        }

        cell
    }
}
