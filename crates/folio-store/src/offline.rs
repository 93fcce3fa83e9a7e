use async_trait::async_trait;
use folio_core::store::Result;
use folio_core::{BucketOutcome, BucketSpec, CounterStore, StoreError};
use jiff::Timestamp;

/// A [`CounterStore`] with nothing behind it.
///
/// Every call fails with [`StoreError::Unavailable`] immediately, so the
/// service keeps running with counters hidden and rate limiting on its
/// in-process fallback.
#[derive(Debug, Clone, Default)]
pub struct OfflineCounterStore {
    reason: String,
}

impl OfflineCounterStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn unavailable<T>(&self) -> Result<T> {
        Err(StoreError::Unavailable(self.reason.clone()))
    }
}

#[async_trait]
impl CounterStore for OfflineCounterStore {
    async fn incr(&self, _key: &str) -> Result<i64> {
        self.unavailable()
    }

    async fn get(&self, _key: &str) -> Result<Option<i64>> {
        self.unavailable()
    }

    async fn get_many(&self, _keys: &[String]) -> Result<Vec<Option<i64>>> {
        self.unavailable()
    }

    async fn record_event(&self, _history_key: &str, _at: Timestamp, _event_id: &str) -> Result<()> {
        self.unavailable()
    }

    async fn count_since(&self, _history_key: &str, _since: Timestamp) -> Result<i64> {
        self.unavailable()
    }

    async fn prune_older_than(&self, _history_key: &str, _cutoff: Timestamp) -> Result<u64> {
        self.unavailable()
    }

    async fn take_tokens(
        &self,
        _bucket_key: &str,
        _spec: &BucketSpec,
        _cost: u32,
        _now: Timestamp,
    ) -> Result<BucketOutcome> {
        self.unavailable()
    }

    async fn ping(&self) -> Result<()> {
        self.unavailable()
    }
}
