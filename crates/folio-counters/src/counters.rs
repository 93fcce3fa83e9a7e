use crate::metric::Metric;
use folio_core::{keys, Clock, ContentId, CounterStore, SystemClock};
use jiff::{SignedDuration, Timestamp};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;
use uuid::Uuid;

/// History entries older than this are pruned on every increment.
pub const DEFAULT_RETENTION: SignedDuration = SignedDuration::from_hours(90 * 24);

/// Width of the rolling window behind the `*_24h` readers.
pub const DEFAULT_WINDOW: SignedDuration = SignedDuration::from_hours(24);

/// Per-content view and share counters.
///
/// Each increment bumps the running total (`<metric>:<id>`) atomically and
/// then appends an event to the history set (`<metric>:<id>:history`) that
/// backs the rolling window, then prunes history past the retention horizon.
/// The writes are independent: a failed history write or prune is logged
/// and the total still counts.
///
/// # Example
///
/// ```rust,no_run
/// use folio_counters::UsageCounters;
/// use folio_core::{ContentId, CounterStore};
/// use std::sync::Arc;
///
/// # async fn example(store: Arc<dyn CounterStore>) {
/// let counters = UsageCounters::builder().store(store).build();
/// let id = ContentId::new("hello-world").unwrap();
///
/// if let Some(views) = counters.increment_view(&id).await {
///     println!("{id} has {views} views");
/// }
/// # }
/// ```
#[derive(Clone, TypedBuilder)]
pub struct UsageCounters {
    store: Arc<dyn CounterStore>,
    #[builder(default = Arc::new(SystemClock))]
    clock: Arc<dyn Clock>,
    #[builder(default = DEFAULT_RETENTION)]
    retention: SignedDuration,
    #[builder(default = DEFAULT_WINDOW)]
    window: SignedDuration,
}

impl UsageCounters {
    pub async fn increment_view(&self, id: &ContentId) -> Option<i64> {
        self.increment(Metric::Views, id).await
    }

    pub async fn get_views(&self, id: &ContentId) -> Option<i64> {
        self.get(Metric::Views, id).await
    }

    pub async fn get_views_24h(&self, id: &ContentId) -> Option<i64> {
        self.get_in_window(Metric::Views, id).await
    }

    pub async fn get_many_views(&self, ids: &[ContentId]) -> HashMap<ContentId, Option<i64>> {
        self.get_many(Metric::Views, ids).await
    }

    pub async fn increment_share(&self, id: &ContentId) -> Option<i64> {
        self.increment(Metric::Shares, id).await
    }

    pub async fn get_shares(&self, id: &ContentId) -> Option<i64> {
        self.get(Metric::Shares, id).await
    }

    pub async fn get_shares_24h(&self, id: &ContentId) -> Option<i64> {
        self.get_in_window(Metric::Shares, id).await
    }

    pub async fn get_many_shares(&self, ids: &[ContentId]) -> HashMap<ContentId, Option<i64>> {
        self.get_many(Metric::Shares, ids).await
    }

    /// Increments the total for `id` and returns the new value, or `None`
    /// when the store could not be reached.
    pub async fn increment(&self, metric: Metric, id: &ContentId) -> Option<i64> {
        let total = match self.store.incr(&keys::total(metric.as_str(), id.as_str())).await {
            Ok(total) => total,
            Err(e) => {
                warn!(%metric, id = %id, error = %e, "failed to increment counter");
                return None;
            }
        };
        trace!(%metric, id = %id, total, "incremented counter");

        self.record_history(metric, id).await;
        Some(total)
    }

    /// Current total, `None` when unknown.
    pub async fn get(&self, metric: Metric, id: &ContentId) -> Option<i64> {
        match self.store.get(&keys::total(metric.as_str(), id.as_str())).await {
            // a key that was never incremented is zero
            Ok(total) => Some(total.unwrap_or(0)),
            Err(e) => {
                warn!(%metric, id = %id, error = %e, "failed to read counter");
                None
            }
        }
    }

    /// Events recorded within the rolling window ending now.
    pub async fn get_in_window(&self, metric: Metric, id: &ContentId) -> Option<i64> {
        let since = self.before_now(self.window)?;
        let history = keys::history(metric.as_str(), id.as_str());

        match self.store.count_since(&history, since).await {
            Ok(count) => Some(count),
            Err(e) => {
                warn!(%metric, id = %id, error = %e, "failed to count counter history");
                None
            }
        }
    }

    /// Reads the totals for `ids` in one round trip. A store failure maps
    /// every id to `None`.
    pub async fn get_many(&self, metric: Metric, ids: &[ContentId]) -> HashMap<ContentId, Option<i64>> {
        if ids.is_empty() {
            return HashMap::new();
        }

        let keys: Vec<String> = ids
            .iter()
            .map(|id| keys::total(metric.as_str(), id.as_str()))
            .collect();

        match self.store.get_many(&keys).await {
            Ok(values) => ids
                .iter()
                .cloned()
                .zip(values.into_iter().map(|value| Some(value.unwrap_or(0))))
                .collect(),
            Err(e) => {
                warn!(%metric, ids = ids.len(), error = %e, "failed to read counters");
                ids.iter().cloned().map(|id| (id, None)).collect()
            }
        }
    }

    async fn record_history(&self, metric: Metric, id: &ContentId) {
        let history = keys::history(metric.as_str(), id.as_str());
        let now = self.clock.now();
        let event_id = Uuid::new_v4().to_string();

        if let Err(e) = self.store.record_event(&history, now, &event_id).await {
            warn!(%metric, id = %id, error = %e, "failed to record counter event");
        }

        let Some(cutoff) = self.before_now(self.retention) else {
            return;
        };
        match self.store.prune_older_than(&history, cutoff).await {
            Ok(0) => {}
            Ok(pruned) => debug!(%metric, id = %id, pruned, "pruned counter history"),
            Err(e) => warn!(%metric, id = %id, error = %e, "failed to prune counter history"),
        }
    }

    fn before_now(&self, span: SignedDuration) -> Option<Timestamp> {
        match self.clock.now().checked_sub(span) {
            Ok(at) => Some(at),
            Err(e) => {
                warn!(error = %e, "counter window starts before the supported time range");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use folio_core::store::Result;
    use folio_core::{BucketOutcome, BucketSpec, ManualClock, StoreError};
    use folio_store::{InMemoryCounterStore, OfflineCounterStore};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Totals live in memory; every history write times out.
    #[derive(Default)]
    struct HistoryTimesOut {
        totals: InMemoryCounterStore,
        prunes: AtomicUsize,
    }

    fn timed_out<T>(operation: &str) -> Result<T> {
        Err(StoreError::Timeout(format!("{operation}: no reply")))
    }

    #[async_trait]
    impl CounterStore for HistoryTimesOut {
        async fn incr(&self, key: &str) -> Result<i64> {
            self.totals.incr(key).await
        }

        async fn get(&self, key: &str) -> Result<Option<i64>> {
            self.totals.get(key).await
        }

        async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<i64>>> {
            self.totals.get_many(keys).await
        }

        async fn record_event(&self, _history_key: &str, _at: Timestamp, _event_id: &str) -> Result<()> {
            timed_out("ZADD")
        }

        async fn count_since(&self, _history_key: &str, _since: Timestamp) -> Result<i64> {
            timed_out("ZCOUNT")
        }

        async fn prune_older_than(&self, _history_key: &str, _cutoff: Timestamp) -> Result<u64> {
            self.prunes.fetch_add(1, Ordering::SeqCst);
            timed_out("ZREMRANGEBYSCORE")
        }

        async fn take_tokens(
            &self,
            bucket_key: &str,
            spec: &BucketSpec,
            cost: u32,
            now: Timestamp,
        ) -> Result<BucketOutcome> {
            self.totals.take_tokens(bucket_key, spec, cost, now).await
        }

        async fn ping(&self) -> Result<()> {
            Ok(())
        }
    }

    fn id(s: &str) -> ContentId {
        ContentId::new(s).unwrap()
    }

    fn start() -> Timestamp {
        Timestamp::from_second(1_700_000_000).unwrap()
    }

    fn counters(store: &InMemoryCounterStore, clock: &ManualClock) -> UsageCounters {
        UsageCounters::builder()
            .store(Arc::new(store.clone()))
            .clock(Arc::new(clock.clone()))
            .build()
    }

    #[tokio::test]
    async fn increment_and_read() {
        let store = InMemoryCounterStore::new();
        let counters = counters(&store, &ManualClock::new(start()));
        let post = id("post");

        assert_eq!(counters.get_views(&post).await, Some(0));
        assert_eq!(counters.increment_view(&post).await, Some(1));
        assert_eq!(counters.increment_view(&post).await, Some(2));
        assert_eq!(counters.increment_share(&post).await, Some(1));

        assert_eq!(counters.get_views(&post).await, Some(2));
        assert_eq!(counters.get_shares(&post).await, Some(1));
        assert_eq!(counters.get_views_24h(&post).await, Some(2));
        assert_eq!(store.get("views:post").await.unwrap(), Some(2));
        assert_eq!(store.get("shares:post").await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn concurrent_increments_are_all_counted() {
        let store = InMemoryCounterStore::new();
        let counters = counters(&store, &ManualClock::new(start()));
        let post = id("hot");
        let mut handles = vec![];

        for _ in 0..100 {
            let counters = counters.clone();
            let post = post.clone();
            handles.push(tokio::spawn(async move {
                counters.increment_view(&post).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(counters.get_views(&post).await, Some(100));
        assert_eq!(counters.get_views_24h(&post).await, Some(100));
    }

    #[tokio::test]
    async fn unavailable_store_yields_none() {
        let counters = UsageCounters::builder()
            .store(Arc::new(OfflineCounterStore::new("no store configured")))
            .build();
        let post = id("post");

        assert_eq!(counters.increment_view(&post).await, None);
        assert_eq!(counters.get_views(&post).await, None);
        assert_eq!(counters.get_views_24h(&post).await, None);
        assert_eq!(counters.get_shares(&post).await, None);

        let many = counters.get_many_views(&[id("a"), id("b")]).await;
        assert_eq!(many.len(), 2);
        assert!(many.values().all(Option::is_none));
    }

    #[tokio::test]
    async fn failed_history_write_keeps_the_increment() {
        let store = Arc::new(HistoryTimesOut::default());
        let counters = UsageCounters::builder()
            .store(store.clone())
            .clock(Arc::new(ManualClock::new(start())))
            .build();
        let post = id("post");

        assert_eq!(counters.increment_view(&post).await, Some(1));
        assert_eq!(counters.increment_share(&post).await, Some(1));
        assert_eq!(counters.increment_view(&post).await, Some(2));
        assert_eq!(counters.get_views(&post).await, Some(2));

        // pruning still runs after each failed event write
        assert_eq!(store.prunes.load(Ordering::SeqCst), 3);
        // a timed out window read is the same as an unreachable store
        assert_eq!(counters.get_views_24h(&post).await, None);
    }

    #[tokio::test]
    async fn window_only_counts_recent_events() {
        let store = InMemoryCounterStore::new();
        let clock = ManualClock::new(start());
        let counters = counters(&store, &clock);
        let post = id("post");

        counters.increment_view(&post).await;
        clock.advance(SignedDuration::from_hours(25));
        counters.increment_view(&post).await;

        assert_eq!(counters.get_views(&post).await, Some(2));
        assert_eq!(counters.get_views_24h(&post).await, Some(1));
    }

    #[tokio::test]
    async fn pruning_keeps_the_total() {
        let store = InMemoryCounterStore::new();
        let clock = ManualClock::new(start());
        let counters = counters(&store, &clock);
        let post = id("post");

        counters.increment_view(&post).await;
        counters.increment_view(&post).await;
        clock.advance(SignedDuration::from_hours(91 * 24));
        counters.increment_view(&post).await;

        // only the event inside the retention horizon survives
        let history = store
            .count_since("views:post:history", Timestamp::UNIX_EPOCH)
            .await
            .unwrap();
        assert_eq!(history, 1);
        assert_eq!(counters.get_views(&post).await, Some(3));
    }

    #[tokio::test]
    async fn get_many_is_aligned_with_ids() {
        let store = InMemoryCounterStore::new();
        let counters = counters(&store, &ManualClock::new(start()));

        counters.increment_share(&id("a")).await;
        counters.increment_share(&id("a")).await;
        counters.increment_share(&id("c")).await;

        let shares = counters.get_many_shares(&[id("a"), id("b"), id("c")]).await;
        assert_eq!(shares[&id("a")], Some(2));
        assert_eq!(shares[&id("b")], Some(0));
        assert_eq!(shares[&id("c")], Some(1));
        assert!(counters.get_many_views(&[]).await.is_empty());
    }
}
