use crate::decision::RateLimitDecision;
use crate::limits::RouteLimits;
use crate::local::LocalBuckets;
use folio_core::{keys, Clock, CounterStore, SystemClock};
use std::sync::Arc;
use tracing::{debug, warn};
use typed_builder::TypedBuilder;

/// Token bucket limiter keyed by `(route, client)`.
///
/// Each check refills and consumes in one atomic store operation. Store
/// failures never reject a request on their own: the same check runs
/// against [`LocalBuckets`] for as long as the store stays away.
#[derive(Clone, TypedBuilder)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    limits: RouteLimits,
    #[builder(default)]
    local: LocalBuckets,
    #[builder(default = Arc::new(SystemClock))]
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Charges `cost` tokens to `client` on `route`.
    pub async fn allow(&self, client: &str, route: &str, cost: u32) -> RateLimitDecision {
        let key = keys::rate_limit(route, client);
        let spec = self.limits.spec_for(route);
        let now = self.clock.now();

        let outcome = match self.store.take_tokens(&key, &spec, cost, now).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(route, client, error = %e, "rate limit store unavailable, using local buckets");
                self.local
                    .take_tokens(&key, &spec, cost, now.as_millisecond())
                    .await
            }
        };

        let decision = RateLimitDecision::from(outcome);
        if let RateLimitDecision::Limited { retry_after } = decision {
            debug!(route, client, retry_after_ms = retry_after.as_millis() as u64, "request rate limited");
        }
        decision
    }

    /// Same as [`RateLimiter::allow`] with a cost of one.
    pub async fn allow_one(&self, client: &str, route: &str) -> RateLimitDecision {
        self.allow(client, route, 1).await
    }

    pub fn local(&self) -> &LocalBuckets {
        &self.local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{BucketSpec, ManualClock};
    use folio_store::{InMemoryCounterStore, OfflineCounterStore};
    use jiff::{SignedDuration, Timestamp};

    fn limits() -> RouteLimits {
        RouteLimits::builder()
            .default_spec(BucketSpec::new(5, 1.0).unwrap())
            .build()
            .with_route("shares", BucketSpec::new(1, 0.5).unwrap())
    }

    fn limiter(store: Arc<dyn CounterStore>, clock: &ManualClock) -> RateLimiter {
        RateLimiter::builder()
            .store(store)
            .limits(limits())
            .clock(Arc::new(clock.clone()))
            .build()
    }

    fn start() -> Timestamp {
        Timestamp::from_second(1_700_000_000).unwrap()
    }

    async fn burst_then_refill(limiter: &RateLimiter, clock: &ManualClock) {
        for expected in (0..5).rev() {
            assert_eq!(
                limiter.allow_one("client", "views").await,
                RateLimitDecision::Allowed {
                    remaining: expected
                }
            );
        }

        let limited = limiter.allow_one("client", "views").await;
        let retry = limited.retry_after().unwrap().as_secs_f64();
        assert!((retry - 1.0).abs() < 1e-6, "retry after was {retry}");
        assert_eq!(limited.retry_after_secs(), Some(1));

        clock.advance(SignedDuration::from_secs(5));
        assert!(limiter.allow("client", "views", 5).await.is_allowed());
        assert!(!limiter.allow_one("client", "views").await.is_allowed());
    }

    #[tokio::test]
    async fn burst_then_refill_against_store() {
        let clock = ManualClock::new(start());
        let limiter = limiter(Arc::new(InMemoryCounterStore::new()), &clock);

        burst_then_refill(&limiter, &clock).await;
        // the store answered every check
        assert_eq!(limiter.local().entry_count(), 0);
    }

    #[tokio::test]
    async fn burst_then_refill_without_store() {
        let clock = ManualClock::new(start());
        let limiter = limiter(Arc::new(OfflineCounterStore::new("redis is down")), &clock);

        burst_then_refill(&limiter, &clock).await;
    }

    #[tokio::test]
    async fn buckets_are_per_client_and_route() {
        let clock = ManualClock::new(start());
        let limiter = limiter(Arc::new(InMemoryCounterStore::new()), &clock);

        assert!(limiter.allow_one("alice", "shares").await.is_allowed());
        let limited = limiter.allow_one("alice", "shares").await;
        assert_eq!(limited.retry_after_secs(), Some(2));

        assert!(limiter.allow_one("bob", "shares").await.is_allowed());
        assert!(limiter.allow_one("alice", "views").await.is_allowed());
    }

    #[tokio::test]
    async fn cost_above_capacity_is_never_allowed() {
        let clock = ManualClock::new(start());
        let limiter = limiter(Arc::new(InMemoryCounterStore::new()), &clock);

        let decision = limiter.allow("client", "views", 6).await;
        assert!(!decision.is_allowed());
        assert_eq!(decision.retry_after_secs(), Some(1));

        clock.advance(SignedDuration::from_hours(1));
        assert!(!limiter.allow("client", "views", 6).await.is_allowed());
    }

    #[tokio::test]
    async fn concurrent_checks_never_overspend() {
        let clock = ManualClock::new(start());
        let limiter = limiter(Arc::new(InMemoryCounterStore::new()), &clock);
        let mut handles = vec![];

        for _ in 0..20 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.allow_one("client", "views").await.is_allowed()
            }));
        }

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 5);
    }
}
