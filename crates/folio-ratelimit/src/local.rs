use folio_core::{BucketOutcome, BucketSpec, TokenBucket};
use moka::future::Cache;
use moka::policy::EvictionPolicy;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

/// Default number of buckets kept in the in-process table.
pub const DEFAULT_LOCAL_CAPACITY: u64 = 10_000;

/// In-process token buckets used while the shared store is unavailable.
///
/// The table is bounded and evicts the least recently used bucket, so a
/// flood of distinct clients cannot grow it without limit. An evicted
/// client simply starts over with a full bucket.
#[derive(Debug, Clone)]
pub struct LocalBuckets {
    buckets: Cache<String, Arc<Mutex<TokenBucket>>>,
}

impl LocalBuckets {
    pub fn new(max_capacity: u64) -> Self {
        let buckets = Cache::builder()
            .max_capacity(max_capacity)
            .eviction_policy(EvictionPolicy::lru())
            .build();
        Self { buckets }
    }

    /// Refills the bucket for `key` and tries to take `cost` tokens.
    pub async fn take_tokens(
        &self,
        key: &str,
        spec: &BucketSpec,
        cost: u32,
        now_ms: i64,
    ) -> BucketOutcome {
        let bucket = self
            .buckets
            .get_with_by_ref(key, async { Arc::new(Mutex::new(TokenBucket::full(spec, now_ms))) })
            .await;

        let outcome = bucket.lock().try_consume(spec, cost, now_ms);
        trace!(key, allowed = outcome.allowed, remaining = outcome.remaining, "local bucket step");
        outcome
    }

    /// Approximate number of buckets held.
    pub fn entry_count(&self) -> u64 {
        self.buckets.entry_count()
    }

    /// Applies pending evictions. Mostly useful in tests.
    pub async fn run_pending_tasks(&self) {
        self.buckets.run_pending_tasks().await;
    }
}

impl Default for LocalBuckets {
    fn default() -> Self {
        Self::new(DEFAULT_LOCAL_CAPACITY)
    }
}
