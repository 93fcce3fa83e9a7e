use async_trait::async_trait;
use folio_core::store::Result;
use folio_core::{BucketOutcome, BucketSpec, CounterStore};
use jiff::Timestamp;
use parking_lot::RwLock;
use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// A [`CounterStore`] whose backend can be replaced while requests are in
/// flight.
///
/// Calls already running keep the backend they started with; calls made
/// after [`SwappableCounterStore::replace`] see the new one.
#[derive(Clone)]
pub struct SwappableCounterStore {
    current: Arc<RwLock<Arc<dyn CounterStore>>>,
}

impl Debug for SwappableCounterStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwappableCounterStore").finish_non_exhaustive()
    }
}

impl SwappableCounterStore {
    pub fn new(initial: Arc<dyn CounterStore>) -> Self {
        Self {
            current: Arc::new(RwLock::new(initial)),
        }
    }

    pub fn replace(&self, next: Arc<dyn CounterStore>) {
        *self.current.write() = next;
    }

    fn current(&self) -> Arc<dyn CounterStore> {
        self.current.read().clone()
    }

    /// Retries `connect` every `interval` until it succeeds, then swaps the
    /// new backend in and stops.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use folio_core::CounterStore;
    /// use folio_store::{OfflineCounterStore, RedisCounterStore, SwappableCounterStore, DEFAULT_TIMEOUT};
    /// use std::sync::Arc;
    /// use std::time::Duration;
    ///
    /// # async fn example() {
    /// let store = SwappableCounterStore::new(Arc::new(OfflineCounterStore::new("redis is down")));
    /// store.reconnect_in_background(Duration::from_secs(5), || async {
    ///     RedisCounterStore::connect("redis://127.0.0.1:6379", DEFAULT_TIMEOUT)
    ///         .await
    ///         .map(|redis| Arc::new(redis) as Arc<dyn CounterStore>)
    /// });
    /// # }
    /// ```
    pub fn reconnect_in_background<F, Fut>(&self, interval: Duration, mut connect: F) -> JoinHandle<()>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Arc<dyn CounterStore>>> + Send + 'static,
    {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // the first tick completes immediately
            ticker.tick().await;
            for attempt in 1u64.. {
                ticker.tick().await;
                match connect().await {
                    Ok(next) => {
                        store.replace(next);
                        info!(attempt, "counter store reconnected");
                        return;
                    }
                    Err(e) => debug!(attempt, error = %e, "counter store still unreachable"),
                }
            }
        })
    }
}

#[async_trait]
impl CounterStore for SwappableCounterStore {
    async fn incr(&self, key: &str) -> Result<i64> {
        self.current().incr(key).await
    }

    async fn get(&self, key: &str) -> Result<Option<i64>> {
        self.current().get(key).await
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<i64>>> {
        self.current().get_many(keys).await
    }

    async fn record_event(&self, history_key: &str, at: Timestamp, event_id: &str) -> Result<()> {
        self.current().record_event(history_key, at, event_id).await
    }

    async fn count_since(&self, history_key: &str, since: Timestamp) -> Result<i64> {
        self.current().count_since(history_key, since).await
    }

    async fn prune_older_than(&self, history_key: &str, cutoff: Timestamp) -> Result<u64> {
        self.current().prune_older_than(history_key, cutoff).await
    }

    async fn take_tokens(
        &self,
        bucket_key: &str,
        spec: &BucketSpec,
        cost: u32,
        now: Timestamp,
    ) -> Result<BucketOutcome> {
        self.current().take_tokens(bucket_key, spec, cost, now).await
    }

    async fn ping(&self) -> Result<()> {
        self.current().ping().await
    }
}
