//! Plan caching
//!
//! Memoizes selection results keyed by a request fingerprint. Concurrent
//! requests for the same fingerprint share one computation.

mod fingerprint;
mod store;

pub use fingerprint::Fingerprint;
pub use store::{CacheStats, PlanCache, DEFAULT_CAPACITY, DEFAULT_EVICT_BATCH};
