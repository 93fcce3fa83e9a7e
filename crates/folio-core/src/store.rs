use crate::bucket::{BucketOutcome, BucketSpec};
use crate::error::StoreError;
use async_trait::async_trait;
use jiff::Timestamp;

/// Type alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;

/// The remote atomic counter store.
///
/// Implementations wrap a key/value + sorted-set store (Redis in
/// production). Every method may suspend on network I/O and must be bounded
/// by a timeout; any failure surfaces as a [`StoreError`] and never as a
/// panic, so callers can switch the dependent feature off for the request.
#[async_trait]
pub trait CounterStore: Send + Sync + 'static {
    /// Atomically increments `key` by one and returns the new value.
    async fn incr(&self, key: &str) -> Result<i64>;

    /// Returns the counter value, or `None` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<i64>>;

    /// Reads several counters in one round trip. The result is aligned with
    /// `keys`.
    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<i64>>>;

    /// Adds `event_id` to the sorted set at `history_key`, scored by `at`.
    async fn record_event(&self, history_key: &str, at: Timestamp, event_id: &str) -> Result<()>;

    /// Counts history entries scored at or after `since`.
    async fn count_since(&self, history_key: &str, since: Timestamp) -> Result<i64>;

    /// Removes history entries scored strictly before `cutoff` and returns
    /// how many were removed.
    async fn prune_older_than(&self, history_key: &str, cutoff: Timestamp) -> Result<u64>;

    /// Refills the bucket stored at `bucket_key` and tries to take `cost`
    /// tokens, as one atomic step.
    async fn take_tokens(
        &self,
        bucket_key: &str,
        spec: &BucketSpec,
        cost: u32,
        now: Timestamp,
    ) -> Result<BucketOutcome>;

    /// Round-trips to the store.
    async fn ping(&self) -> Result<()>;
}

/// Key layout shared with every other reader and writer of the store.
pub mod keys {
    /// `<metric>:<id>`
    pub fn total(metric: &str, id: &str) -> String {
        format!("{metric}:{id}")
    }

    /// `<metric>:<id>:history`
    pub fn history(metric: &str, id: &str) -> String {
        format!("{metric}:{id}:history")
    }

    /// `ratelimit:<route>:<client>`
    pub fn rate_limit(route: &str, client: &str) -> String {
        format!("ratelimit:{route}:{client}")
    }

}
