use async_trait::async_trait;
use dashmap::DashMap;
use folio_core::store::Result;
use folio_core::{BucketOutcome, BucketSpec, CounterStore, TokenBucket};
use jiff::Timestamp;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::trace;

/// A sorted set: unique members, each carrying a score.
#[derive(Debug, Default)]
struct SortedSet {
    scores: HashMap<String, i64>,
    ordered: BTreeSet<(i64, String)>,
}

impl SortedSet {
    fn insert(&mut self, member: &str, score: i64) {
        if let Some(previous) = self.scores.insert(member.to_string(), score) {
            self.ordered.remove(&(previous, member.to_string()));
        }
        self.ordered.insert((score, member.to_string()));
    }

    fn count_from(&self, min: i64) -> i64 {
        self.ordered.range((min, String::new())..).count() as i64
    }

    fn remove_below(&mut self, max_exclusive: i64) -> u64 {
        let kept = self.ordered.split_off(&(max_exclusive, String::new()));
        let removed = std::mem::replace(&mut self.ordered, kept);
        for (_, member) in &removed {
            self.scores.remove(member);
        }
        removed.len() as u64
    }
}

/// In-memory implementation of [`CounterStore`] using DashMap.
///
/// DashMap shards its locks, so increments of different keys proceed in
/// parallel while increments of the same key are serialized by the shard
/// lock, which gives the same no-lost-update guarantee as Redis `INCR`.
/// State is per process and is lost on restart.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCounterStore {
    counters: Arc<DashMap<String, i64>>,
    histories: Arc<DashMap<String, SortedSet>>,
    buckets: Arc<DashMap<String, TokenBucket>>,
}

impl InMemoryCounterStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held in `history_key`.
    pub fn history_len(&self, history_key: &str) -> usize {
        self.histories
            .get(history_key)
            .map_or(0, |set| set.ordered.len())
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn incr(&self, key: &str) -> Result<i64> {
        let mut entry = self.counters.entry(key.to_string()).or_insert(0);
        *entry += 1;
        trace!(key, value = *entry, "incremented in-memory counter");
        Ok(*entry)
    }

    async fn get(&self, key: &str) -> Result<Option<i64>> {
        Ok(self.counters.get(key).map(|v| *v))
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<i64>>> {
        Ok(keys
            .iter()
            .map(|key| self.counters.get(key).map(|v| *v))
            .collect())
    }

    async fn record_event(&self, history_key: &str, at: Timestamp, event_id: &str) -> Result<()> {
        self.histories
            .entry(history_key.to_string())
            .or_default()
            .insert(event_id, at.as_second());
        Ok(())
    }

    async fn count_since(&self, history_key: &str, since: Timestamp) -> Result<i64> {
        Ok(self
            .histories
            .get(history_key)
            .map_or(0, |set| set.count_from(since.as_second())))
    }

    async fn prune_older_than(&self, history_key: &str, cutoff: Timestamp) -> Result<u64> {
        let removed = self
            .histories
            .get_mut(history_key)
            .map_or(0, |mut set| set.remove_below(cutoff.as_second()));
        if removed > 0 {
            trace!(key = history_key, removed, "pruned in-memory history");
        }
        Ok(removed)
    }

    async fn take_tokens(
        &self,
        bucket_key: &str,
        spec: &BucketSpec,
        cost: u32,
        now: Timestamp,
    ) -> Result<BucketOutcome> {
        let now_ms = now.as_millisecond();
        let mut bucket = self
            .buckets
            .entry(bucket_key.to_string())
            .or_insert_with(|| TokenBucket::full(spec, now_ms));
        Ok(bucket.try_consume(spec, cost, now_ms))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::SignedDuration;

    fn ts(seconds: i64) -> Timestamp {
        Timestamp::from_second(seconds).unwrap()
    }

    #[tokio::test]
    async fn incr_and_get() {
        let store = InMemoryCounterStore::new();

        assert_eq!(store.get("views:a").await.unwrap(), None);
        assert_eq!(store.incr("views:a").await.unwrap(), 1);
        assert_eq!(store.incr("views:a").await.unwrap(), 2);
        assert_eq!(store.get("views:a").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn get_many_is_aligned_with_keys() {
        let store = InMemoryCounterStore::new();
        store.incr("views:a").await.unwrap();
        store.incr("views:c").await.unwrap();
        store.incr("views:c").await.unwrap();

        let keys = vec!["views:a".to_string(), "views:b".to_string(), "views:c".to_string()];
        assert_eq!(
            store.get_many(&keys).await.unwrap(),
            vec![Some(1), None, Some(2)]
        );
        assert!(store.get_many(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_increments_are_not_lost() {
        let store = InMemoryCounterStore::new();
        let mut handles = vec![];

        for _ in 0..100 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.incr("views:hot").await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.get("views:hot").await.unwrap(), Some(100));
    }

    #[tokio::test]
    async fn history_window_and_prune() {
        let store = InMemoryCounterStore::new();
        let key = "views:a:history";

        store.record_event(key, ts(100), "e1").await.unwrap();
        store.record_event(key, ts(200), "e2").await.unwrap();
        store.record_event(key, ts(300), "e3").await.unwrap();

        assert_eq!(store.count_since(key, ts(200)).await.unwrap(), 2);
        assert_eq!(store.count_since(key, ts(301)).await.unwrap(), 0);
        assert_eq!(store.count_since("views:none:history", ts(0)).await.unwrap(), 0);

        // entries strictly older than the cutoff go, the one at the cutoff stays
        assert_eq!(store.prune_older_than(key, ts(200)).await.unwrap(), 1);
        assert_eq!(store.history_len(key), 2);
        assert_eq!(store.count_since(key, ts(0)).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn re_recording_a_member_moves_it() {
        let store = InMemoryCounterStore::new();
        let key = "shares:a:history";

        store.record_event(key, ts(100), "same").await.unwrap();
        store.record_event(key, ts(500), "same").await.unwrap();

        assert_eq!(store.history_len(key), 1);
        assert_eq!(store.count_since(key, ts(400)).await.unwrap(), 1);
        assert_eq!(store.prune_older_than(key, ts(400)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn take_tokens_refills_over_time() {
        let store = InMemoryCounterStore::new();
        let spec = BucketSpec::new(2, 1.0).unwrap();
        let start = ts(1_000);

        assert!(store.take_tokens("ratelimit:r:c", &spec, 1, start).await.unwrap().allowed);
        assert!(store.take_tokens("ratelimit:r:c", &spec, 1, start).await.unwrap().allowed);
        let outcome = store.take_tokens("ratelimit:r:c", &spec, 1, start).await.unwrap();
        assert!(!outcome.allowed);
        assert!(outcome.retry_after.is_some());

        let later = start + SignedDuration::from_secs(1);
        assert!(store.take_tokens("ratelimit:r:c", &spec, 1, later).await.unwrap().allowed);
    }
}
